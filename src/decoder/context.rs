use std::rc::Rc;

use crate::qname::{QualifiedName, WireName};
use crate::value::Value;

/// Zustand des Record-Decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DecoderState {
    /// Top level: root element, comments or end of stream.
    ExpectRootOrEnd,
    /// Directly after an element record: attributes, xmlns or content.
    ExpectAttributeOrContent,
    /// Inside an element after its first content record.
    ExpectContent,
    /// EndOfDocument emitted.
    Done,
}

impl DecoderState {
    pub(super) fn name(self) -> &'static str {
        match self {
            Self::ExpectRootOrEnd => "ExpectRootOrEnd",
            Self::ExpectAttributeOrContent => "ExpectAttributeOrContent",
            Self::ExpectContent => "ExpectContent",
            Self::Done => "Done",
        }
    }
}

/// Attribute oder xmlns-Record eines noch offenen Start-Tags (Wire-Reihenfolge).
#[derive(Debug, Clone)]
pub(super) enum PendingItem {
    Xmlns { prefix: Rc<str>, uri: Rc<str> },
    Attribute { name: WireName, value: Value },
}

/// Element record whose attributes are still being collected.
///
/// Namen werden erst aufgelöst wenn alle xmlns-Records des Elements gelesen
/// sind: eine Deklaration gilt auch für Namen, die vor ihr stehen.
#[derive(Debug, Clone)]
pub(super) struct PendingElement {
    pub(super) name: WireName,
    pub(super) items: Vec<PendingItem>,
}

impl PendingElement {
    pub(super) fn new(name: WireName) -> Self {
        Self { name, items: Vec::new() }
    }
}

/// Kontext pro offenem Element (für Element-Stack).
#[derive(Debug, Clone)]
pub(super) struct ElementContext {
    pub(super) name: QualifiedName,
}
