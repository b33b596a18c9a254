//! Record Decoder – binary XML → Node-Sequenz
//!
//! Liest einen Record nach dem anderen (ein Tag-Byte plus Payload, kein
//! Lookahead) und erzeugt die Node-Sequenz. Der Zustandsautomat kennt vier
//! Zustände: `ExpectRootOrEnd`, `ExpectAttributeOrContent`, `ExpectContent`
//! und `Done`.
//!
//! # Beispiel
//!
//! ```
//! use nbfs::decoder::decode;
//! use nbfs::{Node, QualifiedName};
//!
//! // <a/> als ShortElement + EndElement
//! let nodes = decode(&[0x40, 0x01, b'a', 0x01]).unwrap();
//! assert_eq!(nodes, vec![
//!     Node::StartElement(QualifiedName::new("a")),
//!     Node::EndElement,
//!     Node::EndOfDocument,
//! ]);
//! ```

mod api;
mod context;
mod qname;
mod value;
pub use api::{
    decode, decode_iter, decode_iter_with_options, decode_session_message, decode_with_options,
};

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, trace};

use crate::bytestream::ByteReader;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::namespace::NamespaceScope;
use crate::node::{AttributeNode, NamespaceDecl, Node};
use crate::options::{CodecOptions, Limits};
use crate::record::{self, RecordKind};
use crate::string;
use crate::string_table;
use crate::value::Value;

use context::{DecoderState, ElementContext, PendingElement, PendingItem};

/// Streaming-Decoder für eine Nachricht.
///
/// Nodes werden einzeln über [`Decoder::decode_node`] geliefert. Ein Record
/// kann mehrere Nodes erzeugen (Element + Attribute, Text + EndElement); die
/// überzähligen landen im `event_buffer`.
pub struct Decoder<'a> {
    reader: ByteReader<'a>,
    dictionary: Dictionary,
    scope: NamespaceScope,
    element_stack: Vec<ElementContext>,
    state: DecoderState,
    /// Element record whose attributes are still being read.
    pending: Option<PendingElement>,
    event_buffer: VecDeque<Node>,
    limits: Limits,
    node_count: u64,
    root_seen: bool,
    finished: bool,
}

impl<'a> Decoder<'a> {
    /// Erstellt einen Decoder mit Default-Limits.
    pub fn new(data: &'a [u8]) -> Self {
        Self::build(data, Limits::default(), Dictionary::new())
    }

    /// Erstellt einen Decoder mit expliziten Options.
    pub fn with_options(data: &'a [u8], options: &CodecOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(data, options.limits().clone(), Dictionary::new()))
    }

    /// Erstellt einen Decoder auf einem bestehenden Dictionary.
    ///
    /// Für Sessions über mehrere Nachrichten: das Dictionary der vorherigen
    /// Nachricht (siehe [`Decoder::into_dictionary`]) wird weiterverwendet.
    pub fn with_dictionary(
        data: &'a [u8],
        options: &CodecOptions,
        dictionary: Dictionary,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(data, options.limits().clone(), dictionary))
    }

    fn build(data: &'a [u8], limits: Limits, mut dictionary: Dictionary) -> Self {
        dictionary.set_max_session_entries(limits.max_dictionary_entries);
        Self {
            reader: ByteReader::new(data),
            dictionary,
            scope: NamespaceScope::new(),
            element_stack: Vec::new(),
            state: DecoderState::ExpectRootOrEnd,
            pending: None,
            event_buffer: VecDeque::new(),
            limits,
            node_count: 0,
            root_seen: false,
            finished: false,
        }
    }

    /// Liest den String-Table-Block am Nachrichtenanfang (Session-Variante).
    ///
    /// Muss vor dem ersten [`Decoder::decode_node`] aufgerufen werden.
    pub fn read_string_table(&mut self) -> Result<usize> {
        if self.reader.position() != 0 {
            return Err(Error::malformed("string table", self.state.name()));
        }
        string_table::read_string_table(&mut self.reader, &mut self.dictionary, &self.limits)
    }

    /// Dictionary (static + session) of this message.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Gibt das Dictionary zurück (für Folge-Nachrichten derselben Session).
    pub fn into_dictionary(self) -> Dictionary {
        self.dictionary
    }

    /// Aktuelle Verschachtelungstiefe.
    pub fn depth(&self) -> usize {
        self.element_stack.len()
    }

    /// Decodiert den nächsten Node.
    ///
    /// `Ok(None)` nach `EndOfDocument`.
    pub fn decode_node(&mut self) -> Result<Option<Node>> {
        loop {
            if let Some(node) = self.event_buffer.pop_front() {
                return Ok(Some(node));
            }
            if self.finished {
                return Ok(None);
            }
            self.step()?;
        }
    }

    /// Liest einen Record (oder das Stream-Ende) und füllt den Event-Buffer.
    fn step(&mut self) -> Result<()> {
        let Some(tag_byte) = self.reader.peek_u8() else {
            return self.end_of_stream();
        };
        self.reader.read_u8()?;
        let kind = RecordKind::of(tag_byte).ok_or(Error::UnsupportedRecordType(tag_byte))?;
        trace!("record 0x{tag_byte:02X} ({}) in {}", kind.name(), self.state.name());

        // Erster Nicht-Attribut-Record schließt das Start-Tag ab
        if !matches!(kind, RecordKind::Attribute | RecordKind::Xmlns) {
            self.flush_pending()?;
        }

        match kind {
            RecordKind::Element => {
                let name = self.read_element_name(tag_byte)?;
                self.open_element(PendingElement::new(name))
            }
            RecordKind::Attribute => {
                self.ensure_start_tag(kind)?;
                let item = self.read_attribute(tag_byte)?;
                self.push_pending_item(item);
                Ok(())
            }
            RecordKind::Xmlns => {
                self.ensure_start_tag(kind)?;
                let item = self.read_xmlns(tag_byte)?;
                self.push_pending_item(item);
                Ok(())
            }
            RecordKind::Text => {
                if self.element_stack.is_empty() {
                    return Err(Error::malformed(kind.name(), self.state.name()));
                }
                let value = self.read_text(tag_byte)?;
                self.state = DecoderState::ExpectContent;
                self.emit(Node::Text(value))?;
                if record::with_end_element(tag_byte) {
                    self.close_element()?;
                }
                Ok(())
            }
            RecordKind::Comment => {
                let text = string::decode(&mut self.reader, &self.limits)?;
                if !self.element_stack.is_empty() {
                    self.state = DecoderState::ExpectContent;
                }
                self.emit(Node::Comment(text))
            }
            RecordKind::EndElement => self.close_element(),
            RecordKind::Array => self.read_array_record(),
        }
    }

    /// Stream-Ende: nur mit leerem Stack und nach genau einem Root-Element legal.
    fn end_of_stream(&mut self) -> Result<()> {
        if self.pending.is_some() || !self.element_stack.is_empty() || !self.root_seen {
            return Err(Error::TruncatedDocument);
        }
        debug!(
            "decoded {} nodes, session dictionary {} entries",
            self.node_count,
            self.dictionary.session().len()
        );
        self.state = DecoderState::Done;
        self.finished = true;
        self.emit(Node::EndOfDocument)
    }

    /// Beginnt ein neues Element (Root oder Kind-Element).
    fn open_element(&mut self, pending: PendingElement) -> Result<()> {
        if self.element_stack.is_empty() && self.root_seen {
            return Err(Error::malformed("second root element", self.state.name()));
        }
        self.limits.check_depth(self.element_stack.len() + 1)?;
        self.pending = Some(pending);
        self.state = DecoderState::ExpectAttributeOrContent;
        Ok(())
    }

    /// Attribute und xmlns-Records sind nur direkt nach einem Element-Record legal.
    fn ensure_start_tag(&self, kind: RecordKind) -> Result<()> {
        if self.pending.is_none() || self.state != DecoderState::ExpectAttributeOrContent {
            return Err(Error::malformed(kind.name(), self.state.name()));
        }
        Ok(())
    }

    fn push_pending_item(&mut self, item: PendingItem) {
        if let Some(pending) = &mut self.pending {
            pending.items.push(item);
        }
    }

    /// Löst die Namen des gepufferten Start-Tags auf und emittiert
    /// StartElement, Namespace- und Attribute-Nodes in Wire-Reihenfolge.
    fn flush_pending(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        self.scope.push_frame();
        for item in &pending.items {
            if let PendingItem::Xmlns { prefix, uri } = item {
                self.scope.declare(Rc::clone(prefix), Rc::clone(uri));
            }
        }

        let name = self.resolve_name(&pending.name, false)?;
        self.element_stack.push(ElementContext { name: name.clone() });
        self.root_seen = true;
        self.emit(Node::StartElement(name))?;

        for item in pending.items {
            let node = match item {
                PendingItem::Xmlns { prefix, uri } => Node::Namespace(NamespaceDecl { prefix, uri }),
                PendingItem::Attribute { name, value } => {
                    Node::Attribute(AttributeNode::new(self.resolve_name(&name, true)?, value))
                }
            };
            self.emit(node)?;
        }
        Ok(())
    }

    /// Schließt das innerste Element.
    fn close_element(&mut self) -> Result<()> {
        let Some(element) = self.element_stack.pop() else {
            return Err(Error::UnbalancedElement);
        };
        trace!("end element {}", element.name);
        self.scope.pop_frame();
        self.state = if self.element_stack.is_empty() {
            DecoderState::ExpectRootOrEnd
        } else {
            DecoderState::ExpectContent
        };
        self.emit(Node::EndElement)
    }

    /// Array record: Element-Record, Attribute, EndElement, Items.
    fn read_array_record(&mut self) -> Result<()> {
        let element_tag = self.reader.read_u8()?;
        match RecordKind::of(element_tag) {
            Some(RecordKind::Element) => {}
            Some(kind) => return Err(Error::malformed(kind.name(), "Array record")),
            None => return Err(Error::UnsupportedRecordType(element_tag)),
        }
        let name = self.read_element_name(element_tag)?;
        self.open_element(PendingElement::new(name))?;
        loop {
            let t = self.reader.read_u8()?;
            match RecordKind::of(t) {
                Some(RecordKind::EndElement) => break,
                Some(RecordKind::Attribute) => {
                    let item = self.read_attribute(t)?;
                    self.push_pending_item(item);
                }
                Some(RecordKind::Xmlns) => {
                    let item = self.read_xmlns(t)?;
                    self.push_pending_item(item);
                }
                Some(kind) => return Err(Error::malformed(kind.name(), "Array record")),
                None => return Err(Error::UnsupportedRecordType(t)),
            }
        }
        self.flush_pending()?;
        let array = self.read_array_payload()?;
        self.state = DecoderState::ExpectContent;
        self.emit(Node::Text(Value::Array(array)))?;
        self.close_element()
    }

    fn emit(&mut self, node: Node) -> Result<()> {
        self.node_count += 1;
        self.limits.check_nodes(self.node_count)?;
        self.event_buffer.push_back(node);
        Ok(())
    }

    /// Beendet das Decoding und prüft ob der Stream vollständig gelesen wurde.
    pub fn finish(self) -> Result<()> {
        if !self.finished || !self.element_stack.is_empty() {
            return Err(Error::TruncatedDocument);
        }
        Ok(())
    }
}

// ============================================================================
// Iterator API
// ============================================================================

/// Streaming-Decoder Iterator.
///
/// Liefert Nodes einzeln per `next()`. Am Stream-Ende wird `finish()`
/// automatisch aufgerufen; Integritätsfehler werden als letztes `Err` geliefert.
/// Nach dem ersten Fehler liefert der Iterator `None`.
pub struct DecodeIter<'a> {
    decoder: Option<Decoder<'a>>,
}

impl<'a> DecodeIter<'a> {
    pub(crate) fn new(decoder: Decoder<'a>) -> Self {
        Self { decoder: Some(decoder) }
    }

    /// Prüft Stream-Integrität (offene Elemente, fehlendes EndOfDocument).
    ///
    /// Wird automatisch am Ende der Iteration aufgerufen. Kann auch manuell
    /// aufgerufen werden wenn die Iteration vorzeitig abgebrochen wurde.
    pub fn finish(self) -> Result<()> {
        match self.decoder {
            Some(decoder) => decoder.finish(),
            None => Ok(()),
        }
    }
}

impl<'a> Iterator for DecodeIter<'a> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let dec = self.decoder.as_mut()?;
        match dec.decode_node() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                // Automatisch finish() aufrufen, Fehler als letztes Err liefern
                let decoder = self.decoder.take()?;
                decoder.finish().err().map(Err)
            }
            Err(e) => {
                self.decoder = None;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests;
