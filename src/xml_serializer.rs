//! Node-Sequenz → XML-Text.
//!
//! Zwei APIs:
//! - `nodes_to_xml()`: gibt XML als String zurueck (Convenience).
//! - `nodes_to_xml_writer()`: streamt XML direkt in `impl Write`.
//!
//! [`XmlStyle::Exploded`] rueckt pro Tiefe mit einem Tab ein und setzt jedes
//! Attribut auf eine eigene Zeile. Fehlende Namespace-Deklarationen werden
//! ergaenzt. Ein `Value::Array` wird zu wiederholten Geschwister-Elementen
//! mit demselben Start-Tag.

use std::io::Write;
use std::rc::Rc;

use crate::error::Error;
use crate::namespace::NamespaceScope;
use crate::node::{AttributeNode, NamespaceDecl, Node};
use crate::qname::QualifiedName;
use crate::value::{ArrayValue, Value};
use crate::Result;

/// Plattform-Zeilenumbruch fuer [`XmlStyle::Exploded`].
pub const NEWLINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Ausgabeformat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlStyle {
    /// Alles auf einer Zeile.
    #[default]
    Compact,
    /// Tab-Einrueckung pro Tiefe, ein Attribut pro Zeile.
    Exploded,
}

/// Serialisiert Nodes als XML-String.
pub fn nodes_to_xml(nodes: &[Node], style: XmlStyle) -> Result<String> {
    let mut buf = Vec::new();
    nodes_to_xml_writer(nodes, style, &mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::IoError("XML output is not valid UTF-8".into()))
}

/// Serialisiert Nodes direkt in einen Writer.
pub fn nodes_to_xml_writer(nodes: &[Node], style: XmlStyle, writer: impl Write) -> Result<()> {
    let mut ser = XmlStreamSerializer::new(writer, style);
    for node in nodes {
        ser.process(node)?;
    }
    ser.finish()
}

// ============================================================================
// Escaping
// ============================================================================

fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

/// XML-Escaping mit memchr3: grosse Bloecke ohne Escape-Zeichen werden in
/// einem Stueck geschrieben.
fn write_escaped_memchr3(
    w: &mut impl Write,
    s: &str,
    needle: [u8; 3],
    replacement: [&[u8]; 3],
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        let Some(offset) = memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) else {
            w.write_all(&bytes[start..]).map_err(io_err)?;
            break;
        };
        let pos = start + offset;
        w.write_all(&bytes[start..pos]).map_err(io_err)?;
        let replace = match bytes[pos] {
            b if b == needle[0] => replacement[0],
            b if b == needle[1] => replacement[1],
            _ => replacement[2],
        };
        w.write_all(replace).map_err(io_err)?;
        start = pos + 1;
    }
    Ok(())
}

/// Text-Inhalt: & < > → &amp; &lt; &gt;
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])
}

/// Attribut-Werte: & < " → &amp; &lt; &quot;
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])
}

fn write_comment(writer: &mut impl Write, text: &str) -> Result<()> {
    if text.contains("--") || text.ends_with('-') {
        return Err(Error::InvalidValue(
            "comment text contains '--' or ends with '-' (XML 1.0 Section 2.5)".into(),
        ));
    }
    w(writer, "<!--")?;
    w(writer, text)?;
    w(writer, "-->")
}

// ============================================================================
// XmlStreamSerializer
// ============================================================================

/// Start-Tag, das auf Namespace-/Attribute-Nodes wartet.
struct PendingTag {
    name: QualifiedName,
    items: Vec<TagItem>,
}

enum TagItem {
    Namespace(NamespaceDecl),
    Attribute(AttributeNode),
}

struct ElemState {
    name: QualifiedName,
    has_text: bool,
    has_child: bool,
}

/// Streaming XML-Serializer, schreibt direkt in `W: Write`.
pub(crate) struct XmlStreamSerializer<W: Write> {
    writer: W,
    style: XmlStyle,
    element_stack: Vec<ElemState>,
    scope: NamespaceScope,
    pending_start: Option<PendingTag>,
    /// Das Element wurde als Array-Wiederholung bereits komplett geschrieben.
    skip_end: bool,
    wrote_any: bool,
}

impl<W: Write> XmlStreamSerializer<W> {
    pub fn new(writer: W, style: XmlStyle) -> Self {
        Self {
            writer,
            style,
            element_stack: Vec::new(),
            scope: NamespaceScope::new(),
            pending_start: None,
            skip_end: false,
            wrote_any: false,
        }
    }

    pub fn process(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::StartElement(name) => {
                self.flush_pending_start(false)?;
                self.pending_start = Some(PendingTag { name: name.clone(), items: Vec::new() });
            }
            Node::Namespace(decl) => {
                self.pending_mut(node)?.items.push(TagItem::Namespace(decl.clone()));
            }
            Node::Attribute(attribute) => {
                self.pending_mut(node)?.items.push(TagItem::Attribute(attribute.clone()));
            }
            Node::Text(Value::Array(array)) => {
                let tag = self.pending_start.take().ok_or_else(|| {
                    Error::InvalidValue("array values are only legal as the sole content of an element".into())
                })?;
                self.write_array(&tag, array)?;
                self.skip_end = true;
            }
            Node::Text(value) => {
                self.flush_pending_start(false)?;
                let elem = self
                    .element_stack
                    .last_mut()
                    .ok_or_else(|| Error::malformed("Text", "ExpectRootOrEnd"))?;
                elem.has_text = true;
                write_escaped_text(&mut self.writer, &value.to_text())?;
            }
            Node::Comment(text) => {
                self.flush_pending_start(false)?;
                self.indent_for_child()?;
                write_comment(&mut self.writer, text)?;
            }
            Node::EndElement => {
                if self.skip_end {
                    self.skip_end = false;
                } else if self.pending_start.is_some() {
                    self.flush_pending_start(true)?;
                } else {
                    let elem = self.element_stack.pop().ok_or(Error::UnbalancedElement)?;
                    if self.style == XmlStyle::Exploded && elem.has_child && !elem.has_text {
                        self.write_newline_indent(self.element_stack.len())?;
                    }
                    w(&mut self.writer, "</")?;
                    w(&mut self.writer, &elem.name.to_string())?;
                    w(&mut self.writer, ">")?;
                    self.scope.pop_frame();
                }
            }
            Node::EndOfDocument => {
                self.flush_pending_start(false)?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.flush_pending_start(false)?;
        self.writer.flush().map_err(io_err)
    }

    fn pending_mut(&mut self, node: &Node) -> Result<&mut PendingTag> {
        self.pending_start
            .as_mut()
            .ok_or_else(|| Error::malformed(node.kind_name(), "ExpectContent"))
    }

    /// Zeilenumbruch und Einrueckung vor einem Kind-Node (nur Exploded).
    /// In Elementen mit Text wird nicht eingerueckt.
    fn indent_for_child(&mut self) -> Result<()> {
        let depth = self.element_stack.len();
        let indent = match self.element_stack.last_mut() {
            Some(parent) => {
                parent.has_child = true;
                !parent.has_text
            }
            None => self.wrote_any,
        };
        self.wrote_any = true;
        if self.style == XmlStyle::Exploded && indent {
            self.write_newline_indent(depth)?;
        }
        Ok(())
    }

    fn write_newline_indent(&mut self, depth: usize) -> Result<()> {
        w(&mut self.writer, NEWLINE)?;
        for _ in 0..depth {
            w(&mut self.writer, "\t")?;
        }
        Ok(())
    }

    /// Schreibt den gepufferten Start-Tag.
    fn flush_pending_start(&mut self, self_closing: bool) -> Result<()> {
        let Some(tag) = self.pending_start.take() else {
            return Ok(());
        };
        self.write_open_tag(&tag)?;
        if self_closing {
            w(&mut self.writer, "/>")?;
            self.scope.pop_frame();
        } else {
            w(&mut self.writer, ">")?;
            self.element_stack.push(ElemState { name: tag.name, has_text: false, has_child: false });
        }
        Ok(())
    }

    /// Ein Element pro Array-Eintrag, jeweils mit dem vollstaendigen Start-Tag.
    fn write_array(&mut self, tag: &PendingTag, array: &ArrayValue) -> Result<()> {
        let name = tag.name.to_string();
        for text in array.item_texts() {
            self.write_open_tag(tag)?;
            w(&mut self.writer, ">")?;
            write_escaped_text(&mut self.writer, &text)?;
            w(&mut self.writer, "</")?;
            w(&mut self.writer, &name)?;
            w(&mut self.writer, ">")?;
            self.scope.pop_frame();
        }
        Ok(())
    }

    /// `<name` plus Namespace-Deklarationen und Attribute, ohne `>`.
    /// Oeffnet einen Scope-Frame.
    fn write_open_tag(&mut self, tag: &PendingTag) -> Result<()> {
        self.indent_for_child()?;
        let depth = self.element_stack.len();

        self.scope.push_frame();
        for item in &tag.items {
            if let TagItem::Namespace(decl) = item {
                self.scope.declare(Rc::clone(&decl.prefix), Rc::clone(&decl.uri));
            }
        }
        let mut implied = Vec::new();
        self.synthesize_missing_ns(&tag.name, &mut implied);
        for item in &tag.items {
            if let TagItem::Attribute(attribute) = item {
                if attribute.name.prefix.is_empty() {
                    if !attribute.name.namespace.is_empty() {
                        return Err(Error::InvalidValue(format!(
                            "unprefixed attribute '{}' cannot be in namespace '{}'",
                            attribute.name.local, attribute.name.namespace
                        )));
                    }
                    continue;
                }
                self.synthesize_missing_ns(&attribute.name, &mut implied);
            }
        }

        w(&mut self.writer, "<")?;
        w(&mut self.writer, &tag.name.to_string())?;
        for item in &tag.items {
            match item {
                TagItem::Namespace(decl) => self.write_ns_decl(decl, depth)?,
                TagItem::Attribute(attribute) => {
                    self.attribute_separator(depth)?;
                    w(&mut self.writer, &attribute.name.to_string())?;
                    w(&mut self.writer, "=\"")?;
                    write_escaped_attr(&mut self.writer, &attribute.value.to_text())?;
                    w(&mut self.writer, "\"")?;
                }
            }
        }
        for decl in &implied {
            self.write_ns_decl(decl, depth)?;
        }
        Ok(())
    }

    /// Ergaenzt eine Deklaration, falls `(prefix, namespace)` nicht gebunden ist.
    fn synthesize_missing_ns(&mut self, name: &QualifiedName, implied: &mut Vec<NamespaceDecl>) {
        if self.scope.is_bound(&name.prefix, &name.namespace) {
            return;
        }
        self.scope.declare(Rc::clone(&name.prefix), Rc::clone(&name.namespace));
        implied.push(NamespaceDecl::new(Rc::clone(&name.prefix), Rc::clone(&name.namespace)));
    }

    fn write_ns_decl(&mut self, decl: &NamespaceDecl, depth: usize) -> Result<()> {
        self.attribute_separator(depth)?;
        if decl.prefix.is_empty() {
            w(&mut self.writer, "xmlns=\"")?;
        } else {
            w(&mut self.writer, "xmlns:")?;
            w(&mut self.writer, &decl.prefix)?;
            w(&mut self.writer, "=\"")?;
        }
        write_escaped_attr(&mut self.writer, &decl.uri)?;
        w(&mut self.writer, "\"")
    }

    fn attribute_separator(&mut self, depth: usize) -> Result<()> {
        match self.style {
            XmlStyle::Compact => w(&mut self.writer, " "),
            XmlStyle::Exploded => self.write_newline_indent(depth + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns_name(prefix: &str, local: &str, ns: &str) -> QualifiedName {
        QualifiedName::with_namespace(prefix, local, ns)
    }

    #[test]
    fn escape_text_ampersand() {
        let mut buf = Vec::new();
        write_escaped_text(&mut buf, "a&b").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a&amp;b");
    }

    #[test]
    fn escape_text_lt_gt() {
        let mut buf = Vec::new();
        write_escaped_text(&mut buf, "a<b>c").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a&lt;b&gt;c");
    }

    #[test]
    fn escape_attr_quote() {
        let mut buf = Vec::new();
        write_escaped_attr(&mut buf, r#"a"b"#).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a&quot;b");
    }

    #[test]
    fn compact_element_with_text() {
        let nodes = vec![
            Node::StartElement(QualifiedName::new("root")),
            Node::Text(Value::text("hello")),
            Node::EndElement,
            Node::EndOfDocument,
        ];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(), "<root>hello</root>");

        let mut buf = Vec::new();
        nodes_to_xml_writer(&nodes, XmlStyle::Compact, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "<root>hello</root>");
    }

    #[test]
    fn empty_element_self_closes() {
        let nodes = vec![Node::StartElement(QualifiedName::new("a")), Node::EndElement];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(), "<a/>");
    }

    #[test]
    fn typed_values_use_lexical_form() {
        let nodes = vec![
            Node::StartElement(QualifiedName::new("v")),
            Node::Attribute(AttributeNode::new(QualifiedName::new("n"), Value::Int(-5))),
            Node::Text(Value::Bool(true)),
            Node::EndElement,
        ];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(), r#"<v n="-5">true</v>"#);
    }

    #[test]
    fn missing_namespace_declarations_are_added() {
        let ns = "urn:d";
        let nodes = vec![
            Node::StartElement(ns_name("p", "x", ns)),
            Node::StartElement(ns_name("p", "y", ns)),
            Node::EndElement,
            Node::EndElement,
        ];
        assert_eq!(
            nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(),
            r#"<p:x xmlns:p="urn:d"><p:y/></p:x>"#
        );
    }

    #[test]
    fn explicit_declaration_not_repeated() {
        let ns = "urn:d";
        let nodes = vec![
            Node::StartElement(ns_name("", "x", ns)),
            Node::Namespace(NamespaceDecl::new("", ns)),
            Node::EndElement,
        ];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(), r#"<x xmlns="urn:d"/>"#);
    }

    #[test]
    fn exploded_layout() {
        let ns = "urn:d";
        let nodes = vec![
            Node::StartElement(ns_name("s", "Envelope", ns)),
            Node::Namespace(NamespaceDecl::new("s", ns)),
            Node::StartElement(ns_name("s", "Body", ns)),
            Node::StartElement(QualifiedName::new("item")),
            Node::Attribute(AttributeNode::new(QualifiedName::new("id"), Value::Int(1))),
            Node::Text(Value::text("x")),
            Node::EndElement,
            Node::EndElement,
            Node::EndElement,
            Node::EndOfDocument,
        ];
        let expected = [
            "<s:Envelope",
            "\txmlns:s=\"urn:d\">",
            "\t<s:Body>",
            "\t\t<item",
            "\t\t\tid=\"1\">x</item>",
            "\t</s:Body>",
            "</s:Envelope>",
        ]
        .join(NEWLINE);
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Exploded).unwrap(), expected);
    }

    #[test]
    fn exploded_mixed_content_not_indented() {
        let nodes = vec![
            Node::StartElement(QualifiedName::new("p")),
            Node::Text(Value::text("a")),
            Node::StartElement(QualifiedName::new("b")),
            Node::EndElement,
            Node::EndElement,
        ];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Exploded).unwrap(), "<p>a<b/></p>");
    }

    #[test]
    fn array_expands_to_siblings() {
        let nodes = vec![
            Node::StartElement(QualifiedName::new("list")),
            Node::StartElement(QualifiedName::new("i")),
            Node::Attribute(AttributeNode::new(QualifiedName::new("k"), Value::text("v"))),
            Node::Text(Value::Array(ArrayValue::Int32(vec![1, 2, 3]))),
            Node::EndElement,
            Node::EndElement,
        ];
        assert_eq!(
            nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(),
            r#"<list><i k="v">1</i><i k="v">2</i><i k="v">3</i></list>"#
        );
    }

    #[test]
    fn comments() {
        let nodes = vec![
            Node::Comment("top".into()),
            Node::StartElement(QualifiedName::new("a")),
            Node::EndElement,
        ];
        assert_eq!(nodes_to_xml(&nodes, XmlStyle::Compact).unwrap(), "<!--top--><a/>");
        assert_eq!(
            nodes_to_xml(&nodes, XmlStyle::Exploded).unwrap(),
            format!("<!--top-->{NEWLINE}<a/>")
        );

        let bad = vec![Node::Comment("a--b".into())];
        assert!(matches!(nodes_to_xml(&bad, XmlStyle::Compact), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn structural_errors() {
        let attribute_first = vec![Node::Attribute(AttributeNode::new(
            QualifiedName::new("x"),
            Value::Empty,
        ))];
        assert!(matches!(
            nodes_to_xml(&attribute_first, XmlStyle::Compact),
            Err(Error::MalformedRecordSequence { .. })
        ));
        assert_eq!(
            nodes_to_xml(&[Node::EndElement], XmlStyle::Compact),
            Err(Error::UnbalancedElement)
        );
        let array_late = vec![
            Node::StartElement(QualifiedName::new("a")),
            Node::Text(Value::text("x")),
            Node::Text(Value::Array(ArrayValue::Bool(vec![true]))),
        ];
        assert!(matches!(
            nodes_to_xml(&array_late, XmlStyle::Compact),
            Err(Error::InvalidValue(_))
        ));
    }
}
