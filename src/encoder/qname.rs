use std::rc::Rc;

use log::trace;

use crate::dictionary::DictRef;
use crate::encoder::Encoder;
use crate::encoder::pending::{PendingStart, StartItem};
use crate::node::NamespaceDecl;
use crate::qname::{QualifiedName, WireName, XML_NS, XMLNS_NS, prefix_letter_index};
use crate::record::tag;
use crate::string;
use crate::typed_value;
use crate::{Error, Result};

impl Encoder {
    /// Schreibt Element-Record, xmlns- und Attribute-Records eines Start-Tags.
    ///
    /// Fehlende Namespace-Deklarationen für Element- und Attributnamen werden
    /// nach den expliziten Records ergänzt.
    pub(super) fn write_start_tag(&mut self, start: &PendingStart) -> Result<()> {
        self.scope.push_frame();
        for item in &start.items {
            if let StartItem::Namespace(decl) = item {
                self.scope.declare(Rc::clone(&decl.prefix), Rc::clone(&decl.uri));
            }
        }

        let mut implied = Vec::new();
        self.ensure_bound(&start.name, &mut implied)?;
        for item in &start.items {
            if let StartItem::Attribute(attribute) = item {
                if attribute.name.prefix.is_empty() {
                    if !attribute.name.namespace.is_empty() {
                        return Err(Error::InvalidValue(format!(
                            "unprefixed attribute '{}' cannot be in namespace '{}'",
                            attribute.name.local, attribute.name.namespace
                        )));
                    }
                    continue;
                }
                self.ensure_bound(&attribute.name, &mut implied)?;
            }
        }

        self.write_element_record(&start.name)?;
        for item in &start.items {
            match item {
                StartItem::Namespace(decl) => self.write_xmlns_record(decl)?,
                StartItem::Attribute(attribute) => {
                    self.write_attribute_record(&attribute.name)?;
                    typed_value::encode_value(
                        &mut self.writer,
                        &attribute.value,
                        false,
                        self.config.use_dictionary,
                    )?;
                }
            }
        }
        for decl in &implied {
            self.write_xmlns_record(decl)?;
        }
        Ok(())
    }

    /// Deklariert `(prefix, namespace)` von `name`, falls nicht schon gebunden.
    fn ensure_bound(&mut self, name: &QualifiedName, implied: &mut Vec<NamespaceDecl>) -> Result<()> {
        if self.scope.is_bound(&name.prefix, &name.namespace) {
            return Ok(());
        }
        let predefined = matches!(&*name.prefix, "xml" | "xmlns");
        if predefined || self.scope.declared_in_current_frame(&name.prefix) {
            return Err(Error::InvalidValue(format!(
                "prefix '{}' is bound to a different namespace than '{}'",
                name.prefix, name.namespace
            )));
        }
        trace!("implied xmlns:{}=\"{}\"", name.prefix, name.namespace);
        self.scope.declare(Rc::clone(&name.prefix), Rc::clone(&name.namespace));
        implied.push(NamespaceDecl::new(Rc::clone(&name.prefix), Rc::clone(&name.namespace)));
        Ok(())
    }

    /// Dictionary-ID für `text`: statische Tabelle, sonst (Session-Variante)
    /// Session-Tabelle.
    pub(super) fn dictionary_id(&mut self, text: &str) -> Result<Option<u32>> {
        if self.config.use_dictionary
            && let Some(id) = self.dictionary.index_of_static(text)
        {
            return Ok(Some(id));
        }
        if !self.config.session_dictionary {
            return Ok(None);
        }
        match self.dictionary.index_of_session(text) {
            Some(id) => Ok(Some(id)),
            None => self.dictionary.intern_dynamic(text).map(Some),
        }
    }

    /// Wire-Form eines Namens (Dictionary-Referenz oder Inline-String).
    fn wire_name(&mut self, name: &QualifiedName) -> Result<WireName> {
        let local = match self.dictionary_id(&name.local)? {
            Some(id) => DictRef::Index(id),
            None => DictRef::Inline(Rc::clone(&name.local)),
        };
        Ok(WireName::new(Rc::clone(&name.prefix), local))
    }

    /// Element-Record: (kein Prefix / Buchstaben-Prefix / sonstiger Prefix)
    /// × (Dictionary / inline).
    pub(super) fn write_element_record(&mut self, name: &QualifiedName) -> Result<()> {
        let wire = self.wire_name(name)?;
        let tags = NameTags {
            short: tag::SHORT_ELEMENT,
            full: tag::ELEMENT,
            short_dictionary: tag::SHORT_DICTIONARY_ELEMENT,
            dictionary: tag::DICTIONARY_ELEMENT,
            prefix_dictionary_a: tag::PREFIX_DICTIONARY_ELEMENT_A,
            prefix_a: tag::PREFIX_ELEMENT_A,
        };
        self.write_name_record(&wire, &tags)
    }

    /// Attribut-Record (ohne Wert).
    pub(super) fn write_attribute_record(&mut self, name: &QualifiedName) -> Result<()> {
        let wire = self.wire_name(name)?;
        let tags = NameTags {
            short: tag::SHORT_ATTRIBUTE,
            full: tag::ATTRIBUTE,
            short_dictionary: tag::SHORT_DICTIONARY_ATTRIBUTE,
            dictionary: tag::DICTIONARY_ATTRIBUTE,
            prefix_dictionary_a: tag::PREFIX_DICTIONARY_ATTRIBUTE_A,
            prefix_a: tag::PREFIX_ATTRIBUTE_A,
        };
        self.write_name_record(&wire, &tags)
    }

    fn write_name_record(&mut self, wire: &WireName, tags: &NameTags) -> Result<()> {
        let letter = prefix_letter_index(&wire.prefix);
        match (&wire.local, letter, wire.prefix.is_empty()) {
            (DictRef::Index(id), _, true) => {
                self.writer.write_u8(tags.short_dictionary);
                string::encode_dict(&mut self.writer, *id)
            }
            (DictRef::Index(id), Some(letter), false) => {
                self.writer.write_u8(tags.prefix_dictionary_a + letter);
                string::encode_dict(&mut self.writer, *id)
            }
            (DictRef::Index(id), None, false) => {
                self.writer.write_u8(tags.dictionary);
                string::encode(&mut self.writer, &wire.prefix)?;
                string::encode_dict(&mut self.writer, *id)
            }
            (DictRef::Inline(local), _, true) => {
                self.writer.write_u8(tags.short);
                string::encode(&mut self.writer, local)
            }
            (DictRef::Inline(local), Some(letter), false) => {
                self.writer.write_u8(tags.prefix_a + letter);
                string::encode(&mut self.writer, local)
            }
            (DictRef::Inline(local), None, false) => {
                self.writer.write_u8(tags.full);
                string::encode(&mut self.writer, &wire.prefix)?;
                string::encode(&mut self.writer, local)
            }
        }
    }

    /// xmlns-Record: (Default / Prefix) × (Dictionary / inline URI).
    pub(super) fn write_xmlns_record(&mut self, decl: &NamespaceDecl) -> Result<()> {
        let reserved = match &*decl.prefix {
            "xmlns" => true,
            "xml" => &*decl.uri != XML_NS,
            _ => false,
        };
        if reserved {
            return Err(Error::InvalidValue(format!(
                "prefix '{}' cannot be bound to '{}'",
                decl.prefix, decl.uri
            )));
        }
        if &*decl.uri == XMLNS_NS {
            return Err(Error::InvalidValue(format!("namespace '{XMLNS_NS}' cannot be bound")));
        }
        let id = self.dictionary_id(&decl.uri)?;
        match (id, decl.prefix.is_empty()) {
            (Some(id), true) => {
                self.writer.write_u8(tag::SHORT_DICTIONARY_XMLNS_ATTRIBUTE);
                string::encode_dict(&mut self.writer, id)
            }
            (Some(id), false) => {
                self.writer.write_u8(tag::DICTIONARY_XMLNS_ATTRIBUTE);
                string::encode(&mut self.writer, &decl.prefix)?;
                string::encode_dict(&mut self.writer, id)
            }
            (None, true) => {
                self.writer.write_u8(tag::SHORT_XMLNS_ATTRIBUTE);
                string::encode(&mut self.writer, &decl.uri)
            }
            (None, false) => {
                self.writer.write_u8(tag::XMLNS_ATTRIBUTE);
                string::encode(&mut self.writer, &decl.prefix)?;
                string::encode(&mut self.writer, &decl.uri)
            }
        }
    }
}

/// Tag-Familie eines Namens-Records (Element oder Attribut).
struct NameTags {
    short: u8,
    full: u8,
    short_dictionary: u8,
    dictionary: u8,
    prefix_dictionary_a: u8,
    prefix_a: u8,
}
