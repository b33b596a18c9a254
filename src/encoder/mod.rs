//! Record Encoder – Node-Sequenz → binary XML
//!
//! Schreibt für jeden Node die kompakteste legale Record-Form. Die
//! Element-Stack-Disziplin ist dieselbe wie im Decoder; eine nicht
//! wohlgeformte Node-Sequenz wird abgelehnt statt blind geschrieben.
//!
//! # Beispiel
//!
//! ```
//! use nbfs::encoder::encode;
//! use nbfs::{Node, QualifiedName};
//!
//! let nodes = vec![
//!     Node::StartElement(QualifiedName::new("b")),
//!     Node::EndElement,
//!     Node::EndOfDocument,
//! ];
//! let bytes = encode(&nodes).unwrap();
//! assert_eq!(bytes, [0x40, 0x01, b'b', 0x01]);
//! ```

mod config;
mod pending;
mod qname;
mod value;
pub use config::EncoderConfig;

use log::debug;

use crate::bytestream::ByteWriter;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::namespace::NamespaceScope;
use crate::node::Node;
use crate::options::CodecOptions;
use crate::qname::QualifiedName;
use crate::record::tag;
use crate::string;
use crate::string_table;
use crate::value::Value;

use pending::{PendingStart, StartItem};

/// Streaming-Encoder für eine Nachricht.
///
/// Nodes werden einzeln über [`Encoder::encode_node`] übergeben;
/// [`Encoder::finish`] liefert die Bytes. Text wird um einen Node verzögert
/// geschrieben: folgt direkt ein `EndElement`, wird die
/// `...WithEndElement`-Variante verwendet.
pub struct Encoder {
    config: EncoderConfig,
    options: CodecOptions,
    writer: ByteWriter,
    /// Session-Einträge (nur bei `session_dictionary`).
    dictionary: Dictionary,
    scope: NamespaceScope,
    element_stack: Vec<QualifiedName>,
    pending_start: Option<PendingStart>,
    pending_text: Option<Value>,
    root_seen: bool,
    /// EndOfDocument wurde encodiert.
    finished: bool,
    node_count: u64,
}

impl Encoder {
    /// Erstellt einen Encoder mit Default-Limits.
    pub fn new(config: EncoderConfig) -> Self {
        Self::with_options(config, CodecOptions::default())
    }

    /// Erstellt einen Encoder, der `options.limits()` durchsetzt
    /// (Node-Anzahl, Tiefe, Session-Einträge).
    pub fn with_options(config: EncoderConfig, options: CodecOptions) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.set_max_session_entries(options.limits().max_dictionary_entries);
        Self {
            config,
            options,
            writer: ByteWriter::new(),
            dictionary,
            scope: NamespaceScope::new(),
            element_stack: Vec::new(),
            pending_start: None,
            pending_text: None,
            root_seen: false,
            finished: false,
            node_count: 0,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Anzahl bisher geschriebener Body-Bytes.
    pub fn byte_position(&self) -> usize {
        self.writer.len()
    }

    /// Encodiert einen Node.
    pub fn encode_node(&mut self, node: &Node) -> Result<()> {
        if self.finished {
            return Err(Error::malformed(node.kind_name(), "Done"));
        }
        self.node_count += 1;
        self.options.limits().check_nodes(self.node_count)?;
        match node {
            Node::StartElement(name) => {
                self.flush()?;
                if self.element_stack.is_empty() && self.root_seen {
                    return Err(Error::malformed("second root element", "ExpectRootOrEnd"));
                }
                self.options.limits().check_depth(self.element_stack.len() + 1)?;
                self.root_seen = true;
                self.element_stack.push(name.clone());
                self.pending_start = Some(PendingStart::new(name.clone()));
            }
            Node::Namespace(decl) => {
                self.start_tag_mut(node)?.items.push(StartItem::Namespace(decl.clone()));
            }
            Node::Attribute(attribute) => {
                self.start_tag_mut(node)?.items.push(StartItem::Attribute(attribute.clone()));
            }
            Node::Text(value) => {
                if self.element_stack.is_empty() {
                    return Err(Error::malformed("Text", "ExpectRootOrEnd"));
                }
                if let Value::Array(_) = value {
                    // Array nur als einziger Inhalt eines Elements
                    if self.pending_start.is_none() || self.pending_text.is_some() {
                        return Err(array_not_sole_content());
                    }
                } else {
                    self.flush()?;
                }
                self.pending_text = Some(value.clone());
            }
            Node::Comment(text) => {
                self.flush()?;
                self.writer.write_u8(tag::COMMENT);
                string::encode(&mut self.writer, text)?;
            }
            Node::EndElement => {
                if self.element_stack.is_empty() {
                    return Err(Error::UnbalancedElement);
                }
                self.close()?;
                self.element_stack.pop();
                self.scope.pop_frame();
            }
            Node::EndOfDocument => {
                self.flush()?;
                self.check_complete()?;
                self.finished = true;
            }
        }
        Ok(())
    }

    /// Encodiert mehrere Nodes.
    pub fn encode_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        nodes.iter().try_for_each(|node| self.encode_node(node))
    }

    fn start_tag_mut(&mut self, node: &Node) -> Result<&mut PendingStart> {
        let state = if self.element_stack.is_empty() { "ExpectRootOrEnd" } else { "ExpectContent" };
        // Array-Text hält das Start-Tag offen, danach ist es trotzdem Inhalt
        if self.pending_text.is_some() {
            return Err(Error::malformed(node.kind_name(), state));
        }
        self.pending_start
            .as_mut()
            .ok_or_else(|| Error::malformed(node.kind_name(), state))
    }

    /// Ein Nicht-EndElement-Node folgt: Start-Tag und verzögerten Text schreiben.
    fn flush(&mut self) -> Result<()> {
        if matches!(self.pending_text, Some(Value::Array(_))) {
            return Err(array_not_sole_content());
        }
        if let Some(start) = self.pending_start.take() {
            self.write_start_tag(&start)?;
        }
        if let Some(value) = self.pending_text.take() {
            self.write_text(&value, false)?;
        }
        Ok(())
    }

    /// EndElement folgt: letzten Text mit End-Element-Flag schreiben, Array-
    /// Elemente als Array-Record, sonst einen EndElement-Record.
    fn close(&mut self) -> Result<()> {
        if matches!(self.pending_text, Some(Value::Array(_))) {
            let (Some(start), Some(Value::Array(array))) =
                (self.pending_start.take(), self.pending_text.take())
            else {
                return Err(array_not_sole_content());
            };
            return self.write_array_record(&start, &array);
        }
        if let Some(start) = self.pending_start.take() {
            self.write_start_tag(&start)?;
        }
        match self.pending_text.take() {
            Some(value) => self.write_text_closing(&value),
            None => {
                self.writer.write_u8(tag::END_ELEMENT);
                Ok(())
            }
        }
    }

    fn check_complete(&self) -> Result<()> {
        if !self.element_stack.is_empty() {
            return Err(Error::UnbalancedElement);
        }
        if !self.root_seen {
            return Err(Error::malformed("EndOfDocument", "ExpectRootOrEnd"));
        }
        Ok(())
    }

    /// Beendet das Encoding und gibt die Bytes zurück.
    ///
    /// Ein abschließendes `EndOfDocument` ist optional.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if !self.finished {
            self.flush()?;
            self.check_complete()?;
        }
        debug!(
            "encoded {} nodes into {} bytes, {} session strings",
            self.node_count,
            self.writer.len(),
            self.dictionary.session().len()
        );
        if !self.config.session_dictionary {
            return Ok(self.writer.into_vec());
        }
        let mut out = ByteWriter::with_capacity(self.writer.len() + 16);
        string_table::write_string_table(&mut out, self.dictionary.session().iter())?;
        out.write_bytes(self.writer.bytes());
        Ok(out.into_vec())
    }

    /// Finalisiert das Encoding und schreibt die Bytes in `writer`.
    pub fn finish_to(self, writer: &mut impl std::io::Write) -> Result<()> {
        let bytes = self.finish()?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::IoError(format!("Finish: {e}")))
    }
}

fn array_not_sole_content() -> Error {
    Error::InvalidValue("array values are only legal as the sole content of an element".into())
}

// ============================================================================
// High-Level API
// ============================================================================

/// Encodiert eine Node-Sequenz mit Default-Konfiguration.
pub fn encode(nodes: &[Node]) -> Result<Vec<u8>> {
    encode_with_config(nodes, EncoderConfig::default())
}

/// Encodiert eine Node-Sequenz mit expliziter Konfiguration.
pub fn encode_with_config(nodes: &[Node], config: EncoderConfig) -> Result<Vec<u8>> {
    encode_with_options(nodes, config, &CodecOptions::default())
}

/// Encodiert eine Node-Sequenz unter expliziten Limits.
pub fn encode_with_options(
    nodes: &[Node],
    config: EncoderConfig,
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_options(config, options.clone());
    encoder.encode_nodes(nodes)?;
    encoder.finish()
}

// ============================================================================
// Tests
// ============================================================================
