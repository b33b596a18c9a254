//! XML-Text → Node-Sequenz (quick-xml `NsReader`).
//!
//! Namespace-Deklarationen werden zu `Namespace`-Nodes, Element- und
//! Attributnamen werden gegen die Deklarationen im Scope aufgelöst.
//! Benachbarter Text (inkl. CDATA und Referenzen) wird zu einem `Text`-Node
//! zusammengefasst. Reiner Whitespace zwischen Elementen entfällt,
//! Kommentare bleiben erhalten, PIs und DOCTYPE werden verworfen.

use std::borrow::Cow;
use std::rc::Rc;

use log::trace;
use memchr::memchr;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as XmlQName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::Error;
use crate::node::{AttributeNode, NamespaceDecl, Node};
use crate::qname::QualifiedName;
use crate::value::Value;
use crate::Result;

/// Parst ein XML-Dokument in eine wohlgeformte Node-Sequenz (mit
/// abschließendem `EndOfDocument`).
///
/// Ein Dokument ohne Wurzelelement ist ein Fehler.
pub fn parse_xml_nodes(xml: &str) -> Result<Vec<Node>> {
    let mut reader = NsReader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(false);

    let mut parser = TextParser::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                parser.start_element(&reader, &e)?;
            }
            Ok(Event::Empty(e)) => {
                parser.start_element(&reader, &e)?;
                parser.end_element();
            }
            Ok(Event::End(_)) => {
                if parser.depth == 0 {
                    return Err(Error::XmlParseError("unexpected end tag at depth 0".into()));
                }
                parser.end_element();
            }
            Ok(Event::Text(e)) => {
                let raw = utf8(&e)?;
                let text = unescape(raw).map_err(|er| Error::XmlParseError(er.to_string()))?;
                parser.characters(&text)?;
            }
            Ok(Event::CData(e)) => {
                let text = utf8(&e)?.to_owned();
                parser.characters(&text)?;
            }
            Ok(Event::GeneralRef(e)) => {
                let name = utf8(e.as_ref())?;
                let resolved = resolve_reference(name)?;
                parser.characters(&resolved)?;
            }
            Ok(Event::Comment(e)) => {
                let text = normalize_line_endings(utf8(e.as_ref())?).into_owned();
                parser.flush_text(false);
                parser.nodes.push(Node::Comment(Rc::from(text)));
            }
            // Deklaration, PIs und DOCTYPE haben keine Node-Form.
            Ok(Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlParseError(format!(
                    "parse XML error at {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }

    parser.finish()
}

/// Zustand beim Aufbau der Node-Sequenz.
#[derive(Default)]
struct TextParser {
    nodes: Vec<Node>,
    depth: usize,
    root_seen: bool,
    /// Gepufferter Text des aktuellen Elements.
    pending_text: Option<String>,
    /// Pro offenem Element: wurde schon ein Kind-Element gesehen?
    had_child: Vec<bool>,
}

impl TextParser {
    fn start_element(&mut self, reader: &NsReader<&[u8]>, e: &BytesStart<'_>) -> Result<()> {
        self.flush_text(true);
        if self.depth == 0 && self.root_seen {
            return Err(Error::XmlParseError("multiple root elements".into()));
        }
        self.root_seen = true;
        if let Some(flag) = self.had_child.last_mut() {
            *flag = true;
        }

        let (ns, local) = reader.resolver().resolve_element(e.name());
        let name = qualified_name(e.name(), ns, local.as_ref())?;
        self.nodes.push(Node::StartElement(name));

        for attr in e.attributes() {
            let attr = attr.map_err(|er| Error::XmlParseError(er.to_string()))?;
            let raw = utf8(attr.value.as_ref())?;
            let value = unescape(raw).map_err(|er| Error::XmlParseError(er.to_string()))?;
            let value = normalize_line_endings(&value).into_owned();

            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                let prefix = key.get(6..).map(utf8).transpose()?.unwrap_or("");
                trace!("xmlns:{prefix}=\"{value}\"");
                self.nodes.push(Node::Namespace(NamespaceDecl::new(prefix, value)));
                continue;
            }

            let (ns, local) = reader.resolver().resolve_attribute(attr.key);
            let name = qualified_name(attr.key, ns, local.as_ref())?;
            self.nodes.push(Node::Attribute(AttributeNode::new(name, Value::text(value))));
        }

        self.depth += 1;
        self.had_child.push(false);
        Ok(())
    }

    fn end_element(&mut self) {
        self.flush_text(false);
        self.had_child.pop();
        self.depth -= 1;
        self.nodes.push(Node::EndElement);
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.depth == 0 {
            if !is_whitespace(text) {
                return Err(Error::XmlParseError("character data outside root element".into()));
            }
            return Ok(());
        }
        let text = normalize_line_endings(text);
        match &mut self.pending_text {
            Some(existing) => existing.push_str(&text),
            None => self.pending_text = Some(text.into_owned()),
        }
        Ok(())
    }

    /// Schreibt gepufferten Text als `Text`-Node. Reiner Whitespace vor einem
    /// Kind-Element oder in einem Element mit Kindern entfällt.
    fn flush_text(&mut self, before_child: bool) {
        let Some(text) = self.pending_text.take() else {
            return;
        };
        let had_child = self.had_child.last().copied().unwrap_or(false);
        if is_whitespace(&text) && (before_child || had_child) {
            return;
        }
        self.nodes.push(Node::Text(Value::text(text)));
    }

    fn finish(mut self) -> Result<Vec<Node>> {
        if self.depth != 0 {
            return Err(Error::XmlParseError(format!("{} unclosed element(s)", self.depth)));
        }
        if !self.root_seen {
            return Err(Error::XmlParseError("no root element".into()));
        }
        self.nodes.push(Node::EndOfDocument);
        Ok(self.nodes)
    }
}

fn qualified_name(raw: XmlQName<'_>, ns: ResolveResult<'_>, local: &[u8]) -> Result<QualifiedName> {
    let namespace = match ns {
        ResolveResult::Bound(ns) => utf8(ns.into_inner())?,
        ResolveResult::Unbound => "",
        ResolveResult::Unknown(prefix) => {
            return Err(Error::UnresolvedPrefix(String::from_utf8_lossy(&prefix).into_owned()));
        }
    };
    let prefix = match raw.prefix() {
        Some(prefix) => utf8(prefix.into_inner())?,
        None => "",
    };
    Ok(QualifiedName::with_namespace(prefix, utf8(local)?, namespace))
}

/// `&name;` außerhalb von Attributen: Zeichenreferenz oder vordefinierte Entity.
fn resolve_reference(name: &str) -> Result<String> {
    if let Some(digits) = name.strip_prefix('#') {
        let code_point = match digits.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => digits.parse::<u32>().ok(),
        };
        return code_point
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| Error::XmlParseError(format!("invalid character reference &{name};")));
    }
    resolve_predefined_entity(name)
        .map(str::to_owned)
        .ok_or_else(|| Error::XmlParseError(format!("undeclared entity &{name};")))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|er| Error::XmlParseError(er.to_string()))
}

fn is_whitespace(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// XML 1.0 Sec. 2.11: \r\n -> \n, alleinstehende \r -> \n
fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if memchr(b'\r', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}
