//! In-scope namespace bindings.
//!
//! One frame per open element. `xml` and `xmlns` are always bound; an
//! unprefixed name without a default declaration is in no namespace.

use std::rc::Rc;

use crate::qname::{XML_NS, XMLNS_NS};

/// Stack of namespace binding frames.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    /// Alle Bindungen in Deklarationsreihenfolge; `frames` hält die Startindizes.
    bindings: Vec<(Rc<str>, Rc<str>)>,
    frames: Vec<usize>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a frame for a new element.
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Closes the innermost frame and drops its bindings.
    pub fn pop_frame(&mut self) {
        if let Some(start) = self.frames.pop() {
            self.bindings.truncate(start);
        }
    }

    /// Binds `prefix` to `uri` in the innermost frame.
    pub fn declare(&mut self, prefix: Rc<str>, uri: Rc<str>) {
        self.bindings.push((prefix, uri));
    }

    /// Resolves `prefix` to its innermost binding.
    pub fn resolve(&self, prefix: &str) -> Option<Rc<str>> {
        if let Some((_, uri)) = self.bindings.iter().rev().find(|(p, _)| &**p == prefix) {
            return Some(Rc::clone(uri));
        }
        match prefix {
            "" => Some(Rc::from("")),
            "xml" => Some(Rc::from(XML_NS)),
            "xmlns" => Some(Rc::from(XMLNS_NS)),
            _ => None,
        }
    }

    /// True wenn `prefix` aktuell an genau `uri` gebunden ist.
    pub fn is_bound(&self, prefix: &str, uri: &str) -> bool {
        self.resolve(prefix).is_some_and(|bound| &*bound == uri)
    }

    /// True wenn `prefix` im innersten Frame deklariert wurde.
    pub fn declared_in_current_frame(&self, prefix: &str) -> bool {
        let start = self.frames.last().copied().unwrap_or(0);
        self.bindings[start..].iter().any(|(p, _)| &**p == prefix)
    }

    /// Anzahl offener Frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
