//! Dictionary strings (static table + per-message session table).
//!
//! Records refer to strings either inline or by a `DictionaryString` id.
//! Even ids address the static table (`id / 2`), odd ids the session table
//! (`(id - 1) / 2`). The static table is process-wide and read-only; each
//! encode/decode call owns its own session table on top of it.
//!
//! Lifecycle: One `Dictionary` per message (or per session when the caller
//! hands the same [`SessionDictionary`] to consecutive decoders).

use std::rc::Rc;
use std::sync::OnceLock;

use log::{trace, warn};

use crate::static_dictionary::STATIC_STRINGS;
use crate::{Error, FastHashMap, Result};

/// A string as it appears in a record: inline or by dictionary id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictRef {
    /// Literal string carried in the record.
    Inline(Rc<str>),
    /// Dictionary string id (even = static, odd = session).
    Index(u32),
}

impl DictRef {
    /// True wenn die Referenz ins statische Dictionary zeigt.
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Index(id) if id % 2 == 0)
    }
}

/// Wire id of static key `key`.
#[inline]
pub fn static_id(key: u32) -> u32 {
    key * 2
}

/// Wire id of session key `key`.
#[inline]
pub fn session_id(key: u32) -> u32 {
    key * 2 + 1
}

/// Reverse index of the static table, built once per process.
///
/// Bei Duplikaten gewinnt der erste Eintrag (kleinste ID).
fn static_lookup() -> &'static FastHashMap<&'static str, u32> {
    static LOOKUP: OnceLock<FastHashMap<&'static str, u32>> = OnceLock::new();
    LOOKUP.get_or_init(|| {
        let mut map =
            FastHashMap::with_capacity_and_hasher(STATIC_STRINGS.len(), Default::default());
        for (key, s) in STATIC_STRINGS.iter().enumerate() {
            map.entry(*s).or_insert(key as u32);
        }
        map
    })
}

/// Looks up the wire id of `text` in the static table.
pub fn static_index_of(text: &str) -> Option<u32> {
    static_lookup().get(text).map(|&key| static_id(key))
}

/// Returns the static string for a static key.
pub fn static_string(key: u32) -> Option<&'static str> {
    STATIC_STRINGS.get(key as usize).copied()
}

/// The process-wide static table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDictionary;

impl StaticDictionary {
    /// Anzahl statischer Einträge.
    pub fn len(&self) -> usize {
        STATIC_STRINGS.len()
    }

    pub fn is_empty(&self) -> bool {
        STATIC_STRINGS.is_empty()
    }

    /// Entry for static key `key`.
    pub fn get(&self, key: u32) -> Option<&'static str> {
        static_string(key)
    }

    /// Wire id of the first entry equal to `text`.
    pub fn index_of(&self, text: &str) -> Option<u32> {
        static_index_of(text)
    }
}

/// Session-scoped dictionary entries (odd wire ids).
///
/// Entries are appended in order and never reordered or removed.
#[derive(Debug, Clone, Default)]
pub struct SessionDictionary {
    entries: Vec<Rc<str>>,
    lookup: FastHashMap<Rc<str>, u32>,
}

impl SessionDictionary {
    /// Creates an empty session dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Erstellt ein Session-Dictionary mit initialen Strings (Keys 0..n).
    pub fn from_strings<S: AsRef<str>>(strings: impl IntoIterator<Item = S>) -> Self {
        let mut dict = Self::new();
        for s in strings {
            dict.push(s.as_ref());
        }
        dict
    }

    /// Appends `text` and returns its wire id. Duplicates get a new id.
    pub fn push(&mut self, text: &str) -> u32 {
        let key = self.entries.len() as u32;
        let rc: Rc<str> = Rc::from(text);
        self.lookup.entry(Rc::clone(&rc)).or_insert(key);
        self.entries.push(rc);
        session_id(key)
    }

    /// Returns the entry for a session key.
    pub fn get(&self, key: u32) -> Option<&Rc<str>> {
        self.entries.get(key as usize)
    }

    /// Wire id of the first entry equal to `text`.
    pub fn index_of(&self, text: &str) -> Option<u32> {
        self.lookup.get(text).map(|&key| session_id(key))
    }

    /// Anzahl Einträge
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(AsRef::as_ref)
    }
}

/// Combined static + session dictionary for one encode/decode call.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    session: SessionDictionary,
    /// Cache für aufgelöste statische Strings (vermeidet Rc-Allokation pro Record).
    static_cache: FastHashMap<u32, Rc<str>>,
    /// Obergrenze für Session-Einträge (None = unbegrenzt).
    max_session_entries: Option<usize>,
}

impl Dictionary {
    /// Creates a dictionary with an empty session table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary on top of an existing session table.
    pub fn with_session(session: SessionDictionary) -> Self {
        Self { session, ..Self::default() }
    }

    /// Setzt die Obergrenze für Session-Einträge.
    pub fn set_max_session_entries(&mut self, max: Option<usize>) {
        self.max_session_entries = max;
    }

    /// Resolves a record string to its text.
    pub fn resolve(&mut self, r: &DictRef) -> Result<Rc<str>> {
        match r {
            DictRef::Inline(s) => Ok(Rc::clone(s)),
            DictRef::Index(id) => self.resolve_id(*id),
        }
    }

    /// Resolves a dictionary string id.
    pub fn resolve_id(&mut self, id: u32) -> Result<Rc<str>> {
        let key = id / 2;
        if id % 2 == 0 {
            if let Some(s) = self.static_cache.get(&key) {
                return Ok(Rc::clone(s));
            }
            let text = static_string(key).ok_or(Error::UnknownDictionaryIndex(id))?;
            // Ein Duplikat bekommt keine eigene ID, nur der erste Eintrag zählt
            if static_index_of(text) != Some(id) {
                return Err(Error::UnknownDictionaryIndex(id));
            }
            let s: Rc<str> = text.into();
            self.static_cache.insert(key, Rc::clone(&s));
            Ok(s)
        } else {
            self.session
                .get(key)
                .cloned()
                .ok_or(Error::UnknownDictionaryIndex(id))
        }
    }

    /// Appends a session entry and returns its (odd) wire id.
    pub fn intern_dynamic(&mut self, text: &str) -> Result<u32> {
        if let Some(max) = self.max_session_entries
            && self.session.len() >= max
        {
            warn!("session dictionary full: {max} entries");
            return Err(Error::limit("max_dictionary_entries", max as u64));
        }
        let id = self.session.push(text);
        trace!("session dictionary: id {id} = {text:?}");
        Ok(id)
    }

    /// Wire id of `text` in the static table, if present.
    pub fn index_of_static(&self, text: &str) -> Option<u32> {
        static_index_of(text)
    }

    /// Wire id of `text` in the session table, if present.
    pub fn index_of_session(&self, text: &str) -> Option<u32> {
        self.session.index_of(text)
    }

    pub fn session(&self) -> &SessionDictionary {
        &self.session
    }

    /// Gibt das Session-Dictionary zurück (für Folge-Nachrichten derselben Session).
    pub fn into_session(self) -> SessionDictionary {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_dictionary::STATIC_LEN;

    #[test]
    fn resolve_static_even_ids() {
        let mut dict = Dictionary::new();
        assert_eq!(&*dict.resolve_id(0x02).unwrap(), "Envelope");
        assert_eq!(&*dict.resolve_id(0x08).unwrap(), "Header");
        // Zweiter Aufruf kommt aus dem Cache
        assert_eq!(&*dict.resolve_id(0x02).unwrap(), "Envelope");
    }

    #[test]
    fn resolve_inline_passes_through() {
        let mut dict = Dictionary::new();
        let r = DictRef::Inline("Custom".into());
        assert_eq!(&*dict.resolve(&r).unwrap(), "Custom");
    }

    #[test]
    fn resolve_out_of_range_static() {
        let mut dict = Dictionary::new();
        let id = static_id(STATIC_LEN as u32);
        assert_eq!(dict.resolve_id(id).unwrap_err(), Error::UnknownDictionaryIndex(id));
    }

    #[test]
    fn resolve_session_id_without_entry() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.resolve_id(1).unwrap_err(), Error::UnknownDictionaryIndex(1));
    }

    #[test]
    fn intern_dynamic_assigns_odd_ids() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.intern_dynamic("urn:a").unwrap(), 1);
        assert_eq!(dict.intern_dynamic("urn:b").unwrap(), 3);
        assert_eq!(&*dict.resolve_id(3).unwrap(), "urn:b");
        assert_eq!(dict.index_of_session("urn:a"), Some(1));
    }

    #[test]
    fn duplicate_session_strings_get_new_ids() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.intern_dynamic("x").unwrap(), 1);
        assert_eq!(dict.intern_dynamic("x").unwrap(), 3);
        // Lookup liefert den ersten Eintrag
        assert_eq!(dict.index_of_session("x"), Some(1));
        assert_eq!(&*dict.resolve_id(3).unwrap(), "x");
    }

    #[test]
    fn static_lookup_prefers_first_duplicate() {
        let dict = Dictionary::new();
        let id = dict.index_of_static("Detail").unwrap();
        assert_eq!(id, 0x98);
        assert_eq!(dict.index_of_static("NotAWellKnownName"), None);
    }

    #[test]
    fn duplicate_static_entry_has_no_id() {
        let mut dict = Dictionary::new();
        assert_eq!(&*dict.resolve_id(0x98).unwrap(), "Detail");
        assert_eq!(dict.resolve_id(0x3CC).unwrap_err(), Error::UnknownDictionaryIndex(0x3CC));
        assert_eq!(&*dict.resolve_id(0x3CA).unwrap(), "Faultactor");
    }

    #[test]
    fn static_lookup_is_stable_across_dictionaries() {
        let a = Dictionary::new().index_of_static("Envelope");
        let b = Dictionary::new().index_of_static("Envelope");
        assert_eq!(a, Some(0x02));
        assert_eq!(a, b);
    }

    #[test]
    fn session_limit_enforced() {
        let mut dict = Dictionary::new();
        dict.set_max_session_entries(Some(1));
        dict.intern_dynamic("a").unwrap();
        assert_eq!(
            dict.intern_dynamic("b").unwrap_err(),
            Error::limit("max_dictionary_entries", 1)
        );
    }

    #[test]
    fn session_survives_into_next_dictionary() {
        let mut first = Dictionary::new();
        first.intern_dynamic("urn:session").unwrap();
        let mut second = Dictionary::with_session(first.into_session());
        assert_eq!(&*second.resolve_id(1).unwrap(), "urn:session");
    }

    #[test]
    fn static_dictionary_accessors() {
        assert_eq!(StaticDictionary.len(), STATIC_LEN);
        assert_eq!(StaticDictionary.get(1), Some("Envelope"));
        assert_eq!(StaticDictionary.index_of("Body"), Some(0x0E));
        assert_eq!(StaticDictionary.get(STATIC_LEN as u32), None);
    }

    #[test]
    fn dict_ref_is_static() {
        assert!(DictRef::Index(4).is_static());
        assert!(!DictRef::Index(5).is_static());
        assert!(!DictRef::Inline("a".into()).is_static());
    }
}
