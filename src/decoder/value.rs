use crate::decoder::Decoder;
use crate::record::{self, RecordKind, tag};
use crate::typed_value;
use crate::value::{ArrayValue, Value};
use crate::{Error, Result};

impl<'a> Decoder<'a> {
    /// Decodiert den Payload eines Text-Records (Tag bereits gelesen).
    pub(super) fn read_text(&mut self, tag_byte: u8) -> Result<Value> {
        typed_value::decode_value(tag_byte, &mut self.reader, &mut self.dictionary, &self.limits)
    }

    /// Liest den Wert eines Attributs: genau ein Text-Record ohne
    /// End-Element-Flag (bzw. eine StartList...EndList-Folge).
    pub(super) fn read_attribute_value(&mut self) -> Result<Value> {
        let tag_byte = self.reader.read_u8()?;
        if !record::is_text(tag_byte) {
            return match RecordKind::of(tag_byte) {
                Some(kind) => Err(Error::malformed(kind.name(), "attribute value")),
                None => Err(Error::UnsupportedRecordType(tag_byte)),
            };
        }
        if record::with_end_element(tag_byte) {
            // Listen-Tags haben keine WithEndElement-Variante
            if matches!(record::base_text_tag(tag_byte), tag::START_LIST_TEXT | tag::END_LIST_TEXT) {
                return Err(Error::UnsupportedRecordType(tag_byte));
            }
            return Err(Error::malformed(
                format!("text record 0x{tag_byte:02X} with end element"),
                "attribute value",
            ));
        }
        self.read_text(tag_byte)
    }

    /// Item-Typ, Anzahl und Items eines Array-Records.
    pub(super) fn read_array_payload(&mut self) -> Result<ArrayValue> {
        let array = typed_value::decode_array(&mut self.reader, &self.limits)?;
        // Jedes Item zählt als Node gegen max_nodes
        let count = u64::try_from(array.len()).map_err(|_| Error::IntegerOverflow)?;
        self.limits.check_nodes(self.node_count.saturating_add(count))?;
        Ok(array)
    }
}
