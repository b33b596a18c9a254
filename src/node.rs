//! Node model.
//!
//! A document is a flat sequence of nodes in document order. Well-formed
//! sequences follow stack discipline: every `StartElement` has exactly one
//! matching `EndElement`, `Namespace`/`Attribute` nodes come directly after
//! their `StartElement`, there is exactly one root element and text only
//! appears inside it. Comments may also appear at top level.

use std::rc::Rc;

use crate::qname::QualifiedName;
use crate::value::Value;

/// Namespace declaration (`xmlns` / `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix, empty for the default namespace.
    pub prefix: Rc<str>,
    /// Bound URI.
    pub uri: Rc<str>,
}

impl NamespaceDecl {
    pub fn new(prefix: impl Into<Rc<str>>, uri: impl Into<Rc<str>>) -> Self {
        Self { prefix: prefix.into(), uri: uri.into() }
    }
}

/// Attribute with its typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNode {
    pub name: QualifiedName,
    pub value: Value,
}

impl AttributeNode {
    pub fn new(name: QualifiedName, value: Value) -> Self {
        Self { name, value }
    }
}

/// One node of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Opens an element.
    StartElement(QualifiedName),
    /// Namespace declaration on the element just opened.
    Namespace(NamespaceDecl),
    /// Attribute of the element just opened.
    Attribute(AttributeNode),
    /// Content of the currently open element.
    Text(Value),
    /// Comment.
    Comment(Rc<str>),
    /// Closes the innermost open element.
    EndElement,
    /// End of the document (last node of a decoded sequence).
    EndOfDocument,
}

impl Node {
    /// Kurzname für Fehlermeldungen.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::StartElement(_) => "StartElement",
            Self::Namespace(_) => "Namespace",
            Self::Attribute(_) => "Attribute",
            Self::Text(_) => "Text",
            Self::Comment(_) => "Comment",
            Self::EndElement => "EndElement",
            Self::EndOfDocument => "EndOfDocument",
        }
    }

    /// True für Namespace- und Attribute-Nodes.
    pub fn is_attribute_like(&self) -> bool {
        matches!(self, Self::Namespace(_) | Self::Attribute(_))
    }
}
