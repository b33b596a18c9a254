use crate::node::{AttributeNode, NamespaceDecl};
use crate::qname::QualifiedName;

/// Start-Tag, das noch nicht geschrieben wurde.
///
/// Das Element wird erst beim ersten Nicht-Attribut-Node geschrieben: ein
/// Element, dessen einziger Inhalt ein Array ist, braucht das `Array`-Tag
/// vor dem Element-Record.
#[derive(Debug, Clone)]
pub(super) struct PendingStart {
    pub(super) name: QualifiedName,
    /// Namespace- und Attribute-Nodes in Eingabereihenfolge.
    pub(super) items: Vec<StartItem>,
}

#[derive(Debug, Clone)]
pub(super) enum StartItem {
    Namespace(NamespaceDecl),
    Attribute(AttributeNode),
}

impl PendingStart {
    pub(super) fn new(name: QualifiedName) -> Self {
        Self { name, items: Vec::new() }
    }
}
