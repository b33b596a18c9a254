use std::rc::Rc;

use crate::decoder::Decoder;
use crate::decoder::context::PendingItem;
use crate::dictionary::DictRef;
use crate::qname::{QualifiedName, WireName, letter_prefix};
use crate::record::{self, tag};
use crate::string;
use crate::{Error, Result};

impl<'a> Decoder<'a> {
    /// Liest Prefix und Local Name eines Element-Records (Tag bereits gelesen).
    pub(super) fn read_element_name(&mut self, tag_byte: u8) -> Result<WireName> {
        Ok(match tag_byte {
            tag::SHORT_ELEMENT => WireName::new("", self.read_inline()?),
            tag::ELEMENT => {
                let prefix = self.read_prefix()?;
                WireName::new(prefix, self.read_inline()?)
            }
            tag::SHORT_DICTIONARY_ELEMENT => WireName::new("", string::decode_dict(&mut self.reader)?),
            tag::DICTIONARY_ELEMENT => {
                let prefix = self.read_prefix()?;
                WireName::new(prefix, string::decode_dict(&mut self.reader)?)
            }
            tag::PREFIX_DICTIONARY_ELEMENT_A..=tag::PREFIX_DICTIONARY_ELEMENT_Z => {
                let prefix = letter_of(tag_byte)?;
                WireName::new(prefix, string::decode_dict(&mut self.reader)?)
            }
            tag::PREFIX_ELEMENT_A..=tag::PREFIX_ELEMENT_Z => {
                let prefix = letter_of(tag_byte)?;
                WireName::new(prefix, self.read_inline()?)
            }
            _ => return Err(Error::UnsupportedRecordType(tag_byte)),
        })
    }

    /// Liest ein Attribut (Name + Wert) eines Attribute-Records.
    pub(super) fn read_attribute(&mut self, tag_byte: u8) -> Result<PendingItem> {
        let name = match tag_byte {
            tag::SHORT_ATTRIBUTE => WireName::new("", self.read_inline()?),
            tag::ATTRIBUTE => {
                let prefix = self.read_prefix()?;
                WireName::new(prefix, self.read_inline()?)
            }
            tag::SHORT_DICTIONARY_ATTRIBUTE => {
                WireName::new("", string::decode_dict(&mut self.reader)?)
            }
            tag::DICTIONARY_ATTRIBUTE => {
                let prefix = self.read_prefix()?;
                WireName::new(prefix, string::decode_dict(&mut self.reader)?)
            }
            tag::PREFIX_DICTIONARY_ATTRIBUTE_A..=tag::PREFIX_DICTIONARY_ATTRIBUTE_Z => {
                let prefix = letter_of(tag_byte)?;
                WireName::new(prefix, string::decode_dict(&mut self.reader)?)
            }
            tag::PREFIX_ATTRIBUTE_A..=tag::PREFIX_ATTRIBUTE_Z => {
                let prefix = letter_of(tag_byte)?;
                WireName::new(prefix, self.read_inline()?)
            }
            _ => return Err(Error::UnsupportedRecordType(tag_byte)),
        };
        let value = self.read_attribute_value()?;
        Ok(PendingItem::Attribute { name, value })
    }

    /// Liest eine Namespace-Deklaration eines xmlns-Records.
    pub(super) fn read_xmlns(&mut self, tag_byte: u8) -> Result<PendingItem> {
        let (prefix, uri): (Rc<str>, DictRef) = match tag_byte {
            tag::SHORT_XMLNS_ATTRIBUTE => (Rc::from(""), self.read_inline()?),
            tag::XMLNS_ATTRIBUTE => (self.read_prefix()?, self.read_inline()?),
            tag::SHORT_DICTIONARY_XMLNS_ATTRIBUTE => {
                (Rc::from(""), string::decode_dict(&mut self.reader)?)
            }
            tag::DICTIONARY_XMLNS_ATTRIBUTE => {
                (self.read_prefix()?, string::decode_dict(&mut self.reader)?)
            }
            _ => return Err(Error::UnsupportedRecordType(tag_byte)),
        };
        let uri = self.dictionary.resolve(&uri)?;
        Ok(PendingItem::Xmlns { prefix, uri })
    }

    /// Löst einen Wire-Namen gegen Dictionary und Namespace-Scope auf.
    ///
    /// Unprefixed attributes are in no namespace; unprefixed elements take
    /// the default namespace.
    pub(super) fn resolve_name(&mut self, name: &WireName, is_attribute: bool) -> Result<QualifiedName> {
        let local = self.dictionary.resolve(&name.local)?;
        if is_attribute && name.prefix.is_empty() {
            return Ok(QualifiedName::new(local));
        }
        let namespace = self
            .scope
            .resolve(&name.prefix)
            .ok_or_else(|| Error::UnresolvedPrefix(name.prefix.to_string()))?;
        Ok(QualifiedName::with_namespace(Rc::clone(&name.prefix), local, namespace))
    }

    fn read_prefix(&mut self) -> Result<Rc<str>> {
        string::decode(&mut self.reader, &self.limits)
    }

    fn read_inline(&mut self) -> Result<DictRef> {
        Ok(DictRef::Inline(string::decode(&mut self.reader, &self.limits)?))
    }
}

fn letter_of(tag_byte: u8) -> Result<Rc<str>> {
    record::prefix_letter(tag_byte)
        .map(letter_prefix)
        .ok_or(Error::UnsupportedRecordType(tag_byte))
}
