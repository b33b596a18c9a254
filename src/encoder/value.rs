use crate::encoder::Encoder;
use crate::encoder::pending::PendingStart;
use crate::record::tag;
use crate::typed_value::{self, has_end_element_form};
use crate::value::{ArrayValue, Value};
use crate::Result;

impl Encoder {
    /// Schreibt einen Text-Record.
    pub(super) fn write_text(&mut self, value: &Value, end: bool) -> Result<()> {
        typed_value::encode_value(&mut self.writer, value, end, self.config.use_dictionary)
    }

    /// Letzter Text vor EndElement: `WithEndElement`-Variante, falls vorhanden,
    /// sonst Text plus expliziter EndElement-Record.
    pub(super) fn write_text_closing(&mut self, value: &Value) -> Result<()> {
        if has_end_element_form(value) {
            return self.write_text(value, true);
        }
        self.write_text(value, false)?;
        self.writer.write_u8(tag::END_ELEMENT);
        Ok(())
    }

    /// `Array`-Tag, Start-Tag, EndElement, Item-Typ, Anzahl, Items.
    pub(super) fn write_array_record(&mut self, start: &PendingStart, array: &ArrayValue) -> Result<()> {
        self.writer.write_u8(tag::ARRAY);
        self.write_start_tag(start)?;
        self.writer.write_u8(tag::END_ELEMENT);
        typed_value::encode_array(&mut self.writer, array)
    }
}
