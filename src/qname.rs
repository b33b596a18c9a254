//! Qualified names.
//!
//! Element and attribute records carry only a prefix and a local name; the
//! namespace URI comes from the `xmlns` records in scope. [`WireName`] is the
//! name as read from a record, [`QualifiedName`] the resolved form carried by
//! nodes.

use std::fmt;
use std::rc::Rc;

use crate::dictionary::DictRef;

/// Namespace bound to the predefined `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace bound to the predefined `xmlns` prefix.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Resolved element/attribute name.
///
/// Gleichheit über alle drei Teile (prefix, local, namespace): das
/// Binärformat bewahrt Prefixe, ein Round-Trip muss sie also erhalten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Prefix, empty for unprefixed names.
    pub prefix: Rc<str>,
    /// Local name.
    pub local: Rc<str>,
    /// Namespace URI, empty for no namespace.
    pub namespace: Rc<str>,
}

impl QualifiedName {
    /// Unprefixed name in no namespace.
    pub fn new(local: impl Into<Rc<str>>) -> Self {
        Self {
            prefix: Rc::from(""),
            local: local.into(),
            namespace: Rc::from(""),
        }
    }

    /// Name with prefix and namespace.
    pub fn with_namespace(
        prefix: impl Into<Rc<str>>,
        local: impl Into<Rc<str>>,
        namespace: impl Into<Rc<str>>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            local: local.into(),
            namespace: namespace.into(),
        }
    }

    /// Single lowercase-letter prefix as index `0..=25` (`a` = 0).
    ///
    /// Diese Prefixe haben eigene Record-Tags (PrefixElement a-z usw.).
    #[inline]
    pub fn prefix_letter(&self) -> Option<u8> {
        prefix_letter_index(&self.prefix)
    }

    /// True wenn der Name keinen Prefix hat.
    #[inline]
    pub fn is_unprefixed(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// `prefix:local` or `local`.
impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{}:{}", self.prefix, self.local)
        }
    }
}

/// Index of a single-letter prefix `a..=z`.
#[inline]
pub fn prefix_letter_index(prefix: &str) -> Option<u8> {
    match prefix.as_bytes() {
        [b @ b'a'..=b'z'] => Some(b - b'a'),
        _ => None,
    }
}

/// Prefix string for letter index `0..=25`.
pub fn letter_prefix(index: u8) -> Rc<str> {
    Rc::from(char::from(b'a' + index).to_string())
}

/// Unresolved name as read from an element/attribute record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireName {
    pub prefix: Rc<str>,
    pub local: DictRef,
}

impl WireName {
    pub fn new(prefix: impl Into<Rc<str>>, local: DictRef) -> Self {
        Self { prefix: prefix.into(), local }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unprefixed_without_namespace() {
        let q = QualifiedName::new("a");
        assert!(q.is_unprefixed());
        assert_eq!(&*q.namespace, "");
        assert_eq!(q.to_string(), "a");
    }

    #[test]
    fn display_with_prefix() {
        let q = QualifiedName::with_namespace("s", "Envelope", "urn:x");
        assert_eq!(q.to_string(), "s:Envelope");
    }

    #[test]
    fn equality_includes_prefix() {
        let a = QualifiedName::with_namespace("a", "x", "urn:n");
        let b = QualifiedName::with_namespace("b", "x", "urn:n");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn prefix_letters() {
        assert_eq!(prefix_letter_index("a"), Some(0));
        assert_eq!(prefix_letter_index("z"), Some(25));
        assert_eq!(prefix_letter_index(""), None);
        assert_eq!(prefix_letter_index("A"), None);
        assert_eq!(prefix_letter_index("ab"), None);
        assert_eq!(&*letter_prefix(18), "s");
    }

    #[test]
    fn qualified_name_prefix_letter() {
        assert_eq!(QualifiedName::with_namespace("s", "Body", "").prefix_letter(), Some(18));
        assert_eq!(QualifiedName::with_namespace("soap", "Body", "").prefix_letter(), None);
    }
}
