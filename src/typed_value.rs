//! Typed value codec for text records.
//!
//! [`encode_value`] picks the most compact tag that represents a [`Value`]
//! exactly; [`decode_value`] accepts every legal text tag and normalizes it
//! to the logical value. Array payloads ([`encode_array`] /
//! [`decode_array`]) only exist for fixed-width item types.
//!
//! Die Funktionen schreiben/lesen nur den Text-Record selbst. Ob ein Tag mit
//! End-Element-Flag erlaubt ist, entscheidet der Aufrufer.

use crate::bytestream::{ByteReader, ByteWriter};
use crate::dictionary::{Dictionary, static_index_of};
use crate::options::Limits;
use crate::qname::{letter_prefix, prefix_letter_index};
use crate::record::{base_text_tag, is_array_item_tag, tag, with_end_element};
use crate::value::{ArrayValue, Value};
use crate::{Error, Result, datetime, decimal, multi_byte_int, string};

/// Tag mit optionalem End-Element-Flag.
#[inline]
fn flagged(base: u8, end: bool) -> u8 {
    if end { base | 1 } else { base }
}

/// Encodes `value` as one text record (or a StartList...EndList run).
///
/// `end` selects the `WithEndElement` variant. `use_dictionary` allows
/// `DictionaryText` / `QNameDictionaryText` references into the static table.
/// Lists have no `WithEndElement` form; callers must write the EndElement
/// record themselves (see [`has_end_element_form`]).
pub fn encode_value(
    writer: &mut ByteWriter,
    value: &Value,
    end: bool,
    use_dictionary: bool,
) -> Result<()> {
    match value {
        Value::Empty => writer.write_u8(flagged(tag::EMPTY_TEXT, end)),
        Value::Bool(true) => writer.write_u8(flagged(tag::TRUE_TEXT, end)),
        Value::Bool(false) => writer.write_u8(flagged(tag::FALSE_TEXT, end)),
        Value::Int(i) => encode_int(writer, *i, end),
        Value::UInt64(u) => {
            writer.write_u8(flagged(tag::UINT64_TEXT, end));
            writer.write_u64(*u);
        }
        Value::Float(f) => {
            writer.write_u8(flagged(tag::FLOAT_TEXT, end));
            writer.write_f32(*f);
        }
        Value::Double(d) => {
            writer.write_u8(flagged(tag::DOUBLE_TEXT, end));
            writer.write_f64(*d);
        }
        Value::Decimal(d) => {
            writer.write_u8(flagged(tag::DECIMAL_TEXT, end));
            decimal::encode(writer, d)?;
        }
        Value::DateTime(dt) => {
            writer.write_u8(flagged(tag::DATETIME_TEXT, end));
            datetime::encode(writer, dt)?;
        }
        Value::TimeSpan(t) => {
            writer.write_u8(flagged(tag::TIMESPAN_TEXT, end));
            writer.write_i64(*t);
        }
        Value::Guid(g) => {
            writer.write_u8(flagged(tag::UUID_TEXT, end));
            writer.write_bytes(g);
        }
        Value::UniqueId(g) => {
            writer.write_u8(flagged(tag::UNIQUE_ID_TEXT, end));
            writer.write_bytes(g);
        }
        Value::Bytes(b) => {
            let tags = [tag::BYTES8_TEXT, tag::BYTES16_TEXT, tag::BYTES32_TEXT];
            encode_length_prefixed(writer, tags, b, end)?;
        }
        Value::Text(s) => encode_text(writer, s, end, use_dictionary)?,
        Value::UnicodeText(s) => {
            let tags = [
                tag::UNICODE_CHARS8_TEXT,
                tag::UNICODE_CHARS16_TEXT,
                tag::UNICODE_CHARS32_TEXT,
            ];
            encode_length_prefixed(writer, tags, &string::encode_utf16le(s), end)?;
        }
        Value::QName { prefix, local } => {
            let letter = prefix_letter_index(prefix);
            let id = if use_dictionary { static_index_of(local) } else { None };
            match (letter, id) {
                (Some(letter), Some(id)) => {
                    writer.write_u8(flagged(tag::QNAME_DICTIONARY_TEXT, end));
                    writer.write_u8(letter);
                    string::encode_dict(writer, id)?;
                }
                // Kein kompakter Wire-Form: als Text "prefix:local"
                _ => encode_text(writer, &value.to_text(), end, false)?,
            }
        }
        Value::List(items) => {
            if end {
                return Err(Error::InvalidValue(
                    "list text has no WithEndElement form".into(),
                ));
            }
            writer.write_u8(tag::START_LIST_TEXT);
            for item in items {
                if matches!(item, Value::List(_) | Value::Array(_)) {
                    return Err(Error::InvalidValue(format!(
                        "{} value inside a list",
                        item.kind_name()
                    )));
                }
                encode_value(writer, item, false, use_dictionary)?;
            }
            writer.write_u8(tag::END_LIST_TEXT);
        }
        Value::Array(_) => {
            return Err(Error::InvalidValue(
                "array values are only legal as the sole content of an element".into(),
            ));
        }
    }
    Ok(())
}

/// False for values whose record has no `WithEndElement` variant.
pub fn has_end_element_form(value: &Value) -> bool {
    !matches!(value, Value::List(_) | Value::Array(_))
}

/// Kleinste exakte Integer-Darstellung.
fn encode_int(writer: &mut ByteWriter, i: i64, end: bool) {
    match i {
        0 => writer.write_u8(flagged(tag::ZERO_TEXT, end)),
        1 => writer.write_u8(flagged(tag::ONE_TEXT, end)),
        _ => {
            if let Ok(v) = i8::try_from(i) {
                writer.write_u8(flagged(tag::INT8_TEXT, end));
                writer.write_i8(v);
            } else if let Ok(v) = i16::try_from(i) {
                writer.write_u8(flagged(tag::INT16_TEXT, end));
                writer.write_i16(v);
            } else if let Ok(v) = i32::try_from(i) {
                writer.write_u8(flagged(tag::INT32_TEXT, end));
                writer.write_i32(v);
            } else {
                writer.write_u8(flagged(tag::INT64_TEXT, end));
                writer.write_i64(i);
            }
        }
    }
}

fn encode_text(writer: &mut ByteWriter, s: &str, end: bool, use_dictionary: bool) -> Result<()> {
    if use_dictionary && let Some(id) = static_index_of(s) {
        writer.write_u8(flagged(tag::DICTIONARY_TEXT, end));
        return string::encode_dict(writer, id);
    }
    let tags = [tag::CHARS8_TEXT, tag::CHARS16_TEXT, tag::CHARS32_TEXT];
    encode_length_prefixed(writer, tags, s.as_bytes(), end)
}

/// Schreibt `payload` mit u8/u16/i32-Längenpräfix (kleinste passende Variante).
fn encode_length_prefixed(
    writer: &mut ByteWriter,
    [tag8, tag16, tag32]: [u8; 3],
    payload: &[u8],
    end: bool,
) -> Result<()> {
    let len = payload.len();
    if let Ok(l) = u8::try_from(len) {
        writer.write_u8(flagged(tag8, end));
        writer.write_u8(l);
    } else if let Ok(l) = u16::try_from(len) {
        writer.write_u8(flagged(tag16, end));
        writer.write_u16(l);
    } else {
        let l = i32::try_from(len).map_err(|_| Error::IntegerOverflow)?;
        writer.write_u8(flagged(tag32, end));
        writer.write_i32(l);
    }
    writer.write_bytes(payload);
    Ok(())
}

/// Decodes the payload of text record `tag_byte` (tag already consumed).
pub fn decode_value(
    tag_byte: u8,
    reader: &mut ByteReader,
    dictionary: &mut Dictionary,
    limits: &Limits,
) -> Result<Value> {
    let value = match base_text_tag(tag_byte) {
        tag::ZERO_TEXT => Value::Int(0),
        tag::ONE_TEXT => Value::Int(1),
        tag::FALSE_TEXT => Value::Bool(false),
        tag::TRUE_TEXT => Value::Bool(true),
        tag::INT8_TEXT => Value::Int(i64::from(reader.read_i8()?)),
        tag::INT16_TEXT => Value::Int(i64::from(reader.read_i16()?)),
        tag::INT32_TEXT => Value::Int(i64::from(reader.read_i32()?)),
        tag::INT64_TEXT => Value::Int(reader.read_i64()?),
        tag::FLOAT_TEXT => Value::Float(reader.read_f32()?),
        tag::DOUBLE_TEXT => Value::Double(reader.read_f64()?),
        tag::DECIMAL_TEXT => Value::Decimal(decimal::decode(reader)?),
        tag::DATETIME_TEXT => Value::DateTime(datetime::decode(reader)?),
        tag::CHARS8_TEXT | tag::CHARS16_TEXT | tag::CHARS32_TEXT => {
            let bytes = read_length_prefixed(tag_byte, reader, limits)?;
            Value::Text(string::decode_utf8(bytes)?)
        }
        tag::BYTES8_TEXT | tag::BYTES16_TEXT | tag::BYTES32_TEXT => {
            Value::Bytes(read_length_prefixed(tag_byte, reader, limits)?.to_vec())
        }
        tag::UNICODE_CHARS8_TEXT | tag::UNICODE_CHARS16_TEXT | tag::UNICODE_CHARS32_TEXT => {
            let bytes = read_length_prefixed(tag_byte, reader, limits)?;
            Value::UnicodeText(string::decode_utf16le(bytes)?)
        }
        tag::START_LIST_TEXT if tag_byte == tag::START_LIST_TEXT => {
            decode_list(reader, dictionary, limits)?
        }
        tag::EMPTY_TEXT => Value::Empty,
        tag::DICTIONARY_TEXT => {
            let id = multi_byte_int::decode(reader)?;
            Value::Text(dictionary.resolve_id(id)?)
        }
        tag::UNIQUE_ID_TEXT => Value::UniqueId(reader.read_array()?),
        tag::TIMESPAN_TEXT => Value::TimeSpan(reader.read_i64()?),
        tag::UUID_TEXT => Value::Guid(reader.read_array()?),
        tag::UINT64_TEXT => Value::UInt64(reader.read_u64()?),
        tag::BOOL_TEXT => Value::Bool(read_bool(reader)?),
        tag::QNAME_DICTIONARY_TEXT => {
            let letter = reader.read_u8()?;
            if letter > 25 {
                return Err(Error::InvalidValue(format!("QName prefix index {letter}")));
            }
            let id = multi_byte_int::decode(reader)?;
            Value::QName {
                prefix: letter_prefix(letter),
                local: dictionary.resolve_id(id)?,
            }
        }
        // EndListText außerhalb einer Liste, 0xA5/0xA7, Nicht-Text-Tags
        _ => return Err(Error::UnsupportedRecordType(tag_byte)),
    };
    Ok(value)
}

fn read_bool(reader: &mut ByteReader) -> Result<bool> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(Error::InvalidValue(format!("bool byte 0x{b:02X}"))),
    }
}

/// Liest u8/u16/i32-Längenpräfix + Payload je nach Tag-Breite.
fn read_length_prefixed<'a>(
    tag_byte: u8,
    reader: &mut ByteReader<'a>,
    limits: &Limits,
) -> Result<&'a [u8]> {
    let len = match base_text_tag(tag_byte) {
        tag::CHARS8_TEXT | tag::BYTES8_TEXT | tag::UNICODE_CHARS8_TEXT => {
            usize::from(reader.read_u8()?)
        }
        tag::CHARS16_TEXT | tag::BYTES16_TEXT | tag::UNICODE_CHARS16_TEXT => {
            usize::from(reader.read_u16()?)
        }
        _ => {
            let l = reader.read_i32()?;
            usize::try_from(l)
                .map_err(|_| Error::InvalidValue(format!("negative payload length {l}")))?
        }
    };
    limits.check_payload(len)?;
    reader.read_bytes(len)
}

/// StartListText bereits gelesen: Items bis EndListText.
fn decode_list(
    reader: &mut ByteReader,
    dictionary: &mut Dictionary,
    limits: &Limits,
) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        let item_tag = reader.read_u8()?;
        match item_tag {
            tag::END_LIST_TEXT => return Ok(Value::List(items)),
            tag::START_LIST_TEXT => {
                return Err(Error::malformed("StartListText", "inside list"));
            }
            t if with_end_element(t) => {
                return Err(Error::malformed("text record with end element", "inside list"));
            }
            t => {
                if let Some(max) = limits.max_nodes
                    && items.len() as u64 >= max
                {
                    return Err(Error::limit("max_nodes", max));
                }
                items.push(decode_value(t, reader, dictionary, limits)?);
            }
        }
    }
}

/// Byte width of one array item; `None` for tags that cannot be array items.
pub fn array_item_width(item_tag: u8) -> Option<usize> {
    if !is_array_item_tag(item_tag) {
        return None;
    }
    Some(match base_text_tag(item_tag) {
        tag::BOOL_TEXT => 1,
        tag::INT16_TEXT => 2,
        tag::INT32_TEXT | tag::FLOAT_TEXT => 4,
        tag::INT64_TEXT | tag::DOUBLE_TEXT | tag::DATETIME_TEXT | tag::TIMESPAN_TEXT => 8,
        _ => 16,
    })
}

/// Writes item type tag (WithEndElement form), count and items.
pub fn encode_array(writer: &mut ByteWriter, array: &ArrayValue) -> Result<()> {
    writer.write_u8(array.item_tag() | 1);
    let count = u32::try_from(array.len()).map_err(|_| Error::IntegerOverflow)?;
    multi_byte_int::encode(writer, count)?;
    match array {
        ArrayValue::Bool(v) => v.iter().for_each(|&b| writer.write_u8(u8::from(b))),
        ArrayValue::Int16(v) => v.iter().for_each(|&i| writer.write_i16(i)),
        ArrayValue::Int32(v) => v.iter().for_each(|&i| writer.write_i32(i)),
        ArrayValue::Int64(v) => v.iter().for_each(|&i| writer.write_i64(i)),
        ArrayValue::Float(v) => v.iter().for_each(|&f| writer.write_f32(f)),
        ArrayValue::Double(v) => v.iter().for_each(|&d| writer.write_f64(d)),
        ArrayValue::Decimal(v) => v.iter().try_for_each(|d| decimal::encode(writer, d))?,
        ArrayValue::DateTime(v) => v.iter().try_for_each(|dt| datetime::encode(writer, dt))?,
        ArrayValue::TimeSpan(v) => v.iter().for_each(|&t| writer.write_i64(t)),
        ArrayValue::Guid(v) => v.iter().for_each(|g| writer.write_bytes(g)),
    }
    Ok(())
}

/// Reads item type tag, count and items of an Array record.
pub fn decode_array(reader: &mut ByteReader, limits: &Limits) -> Result<ArrayValue> {
    let item_tag = reader.read_u8()?;
    let width = array_item_width(item_tag).ok_or_else(|| {
        if is_array_item_tag(item_tag | 1) {
            // Richtiger Typ, aber ohne End-Element-Flag
            Error::malformed(format!("array item type 0x{item_tag:02X}"), "Array record")
        } else {
            Error::UnsupportedRecordType(item_tag)
        }
    })?;
    let count = multi_byte_int::decode(reader)? as usize;
    let total = count.checked_mul(width).ok_or(Error::IntegerOverflow)?;
    limits.check_payload(total)?;
    // Vor der Allokation prüfen: count kann aus feindlicher Eingabe stammen
    if total > reader.remaining() {
        return Err(Error::TruncatedInput);
    }

    macro_rules! read_items {
        ($variant:ident, $read:expr) => {{
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push($read?);
            }
            ArrayValue::$variant(items)
        }};
    }

    Ok(match base_text_tag(item_tag) {
        tag::BOOL_TEXT => read_items!(Bool, read_bool(reader)),
        tag::INT16_TEXT => read_items!(Int16, reader.read_i16()),
        tag::INT32_TEXT => read_items!(Int32, reader.read_i32()),
        tag::INT64_TEXT => read_items!(Int64, reader.read_i64()),
        tag::FLOAT_TEXT => read_items!(Float, reader.read_f32()),
        tag::DOUBLE_TEXT => read_items!(Double, reader.read_f64()),
        tag::DECIMAL_TEXT => read_items!(Decimal, decimal::decode(reader)),
        tag::DATETIME_TEXT => read_items!(DateTime, datetime::decode(reader)),
        tag::TIMESPAN_TEXT => read_items!(TimeSpan, reader.read_i64()),
        _ => read_items!(Guid, reader.read_array::<16>()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::{DateTime, DateTimeKind};
    use crate::decimal::Decimal;

    fn encode_to_vec(value: &Value, end: bool) -> Vec<u8> {
        let mut w = ByteWriter::new();
        encode_value(&mut w, value, end, true).unwrap();
        w.into_vec()
    }

    fn decode_bytes(data: &[u8]) -> Result<Value> {
        let mut r = ByteReader::new(&data[1..]);
        let mut dict = Dictionary::new();
        let v = decode_value(data[0], &mut r, &mut dict, &Limits::default())?;
        assert!(r.is_empty(), "payload not fully consumed");
        Ok(v)
    }

    fn round_trip(value: &Value) -> Value {
        decode_bytes(&encode_to_vec(value, false)).unwrap()
    }

    #[test]
    fn integers_use_smallest_width() {
        assert_eq!(encode_to_vec(&Value::Int(0), false), vec![0x80]);
        assert_eq!(encode_to_vec(&Value::Int(1), false), vec![0x82]);
        assert_eq!(encode_to_vec(&Value::Int(-1), false), vec![0x88, 0xFF]);
        assert_eq!(encode_to_vec(&Value::Int(127), false), vec![0x88, 0x7F]);
        assert_eq!(encode_to_vec(&Value::Int(128), false), vec![0x8A, 0x80, 0x00]);
        assert_eq!(encode_to_vec(&Value::Int(40_000), false)[0], 0x8C);
        assert_eq!(encode_to_vec(&Value::Int(300_000_000_000), false)[0], 0x8E);
    }

    #[test]
    fn integers_normalize_to_logical_value() {
        for i in [0, 1, -1, 127, -128, 32_767, 40_000, 300_000_000_000, i64::MIN, i64::MAX] {
            assert_eq!(round_trip(&Value::Int(i)), Value::Int(i), "value {i}");
        }
        // Int64Text mit kleinem Wert ist legal und liefert denselben Wert
        let mut data = vec![0x8E];
        data.extend_from_slice(&0i64.to_le_bytes());
        assert_eq!(decode_bytes(&data).unwrap(), Value::Int(0));
    }

    #[test]
    fn end_element_flag_sets_low_bit() {
        assert_eq!(encode_to_vec(&Value::Bool(true), true), vec![0x87]);
        assert_eq!(encode_to_vec(&Value::Empty, true), vec![0xA9]);
        assert_eq!(encode_to_vec(&Value::text("Hello"), true)[0], 0x99);
    }

    #[test]
    fn text_prefers_static_dictionary() {
        assert_eq!(encode_to_vec(&Value::text("Envelope"), false), vec![0xAA, 0x02]);
        let mut w = ByteWriter::new();
        encode_value(&mut w, &Value::text("Envelope"), false, false).unwrap();
        assert_eq!(w.into_vec()[0], tag::CHARS8_TEXT);
        assert_eq!(round_trip(&Value::text("Envelope")), Value::text("Envelope"));
    }

    #[test]
    fn chars_width_by_byte_length() {
        let short = "a".repeat(255);
        let medium = "a".repeat(256);
        let long = "a".repeat(70_000);
        assert_eq!(encode_to_vec(&Value::text(short.as_str()), false)[0], tag::CHARS8_TEXT);
        assert_eq!(encode_to_vec(&Value::text(medium.as_str()), false)[0], tag::CHARS16_TEXT);
        assert_eq!(encode_to_vec(&Value::text(long.as_str()), false)[0], tag::CHARS32_TEXT);
        assert_eq!(round_trip(&Value::text(long.as_str())), Value::text(long.as_str()));
    }

    #[test]
    fn scalar_round_trips() {
        let dt = DateTime::from_parts(2010, 3, 4, 5, 6, 7, 0, DateTimeKind::Utc).unwrap();
        let values = [
            Value::Empty,
            Value::Bool(false),
            Value::UInt64(u64::MAX),
            Value::Float(1.25),
            Value::Double(-2.5e300),
            Value::Decimal(Decimal::new(12345, 3, true).unwrap()),
            Value::DateTime(dt),
            Value::TimeSpan(-36_000_000_000),
            Value::Guid([7; 16]),
            Value::UniqueId([9; 16]),
            Value::Bytes(vec![0, 1, 2, 255]),
            Value::UnicodeText("grüße".into()),
            Value::QName { prefix: "s".into(), local: "Envelope".into() },
        ];
        for v in &values {
            assert_eq!(&round_trip(v), v, "{}", v.kind_name());
        }
    }

    #[test]
    fn qname_without_dictionary_entry_falls_back_to_text() {
        let v = Value::QName { prefix: "tns".into(), local: "Custom".into() };
        assert_eq!(round_trip(&v), Value::text("tns:Custom"));
    }

    #[test]
    fn list_round_trip_and_layout() {
        let list = Value::List(vec![Value::Int(1), Value::text("x")]);
        let data = encode_to_vec(&list, false);
        assert_eq!(data, vec![0xA4, 0x82, 0x98, 0x01, b'x', 0xA6]);
        assert_eq!(decode_bytes(&data).unwrap(), list);
    }

    #[test]
    fn list_has_no_end_element_form() {
        let mut w = ByteWriter::new();
        let list = Value::List(vec![]);
        assert!(matches!(encode_value(&mut w, &list, true, true), Err(Error::InvalidValue(_))));
        assert!(!has_end_element_form(&list));
        assert_eq!(decode_bytes(&[0xA5]).unwrap_err(), Error::UnsupportedRecordType(0xA5));
    }

    #[test]
    fn nested_list_rejected() {
        assert!(matches!(
            decode_bytes(&[0xA4, 0xA4, 0xA6, 0xA6]),
            Err(Error::MalformedRecordSequence { .. })
        ));
        let mut w = ByteWriter::new();
        let nested = Value::List(vec![Value::List(vec![])]);
        assert!(encode_value(&mut w, &nested, false, true).is_err());
    }

    #[test]
    fn declared_length_exceeds_input() {
        assert_eq!(decode_bytes(&[0x98, 0x05, b'a']).unwrap_err(), Error::TruncatedInput);
        assert_eq!(decode_bytes(&[0x9E, 0x03]).unwrap_err(), Error::TruncatedInput);
    }

    #[test]
    fn negative_chars32_length_rejected() {
        let mut data = vec![0x9C];
        data.extend_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(decode_bytes(&data), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn payload_limit_enforced() {
        let data = encode_to_vec(&Value::Bytes(vec![0; 100]), false);
        let mut r = ByteReader::new(&data[1..]);
        let mut dict = Dictionary::new();
        let limits = Limits { max_payload_len: Some(99), ..Limits::unbounded() };
        assert_eq!(
            decode_value(data[0], &mut r, &mut dict, &limits).unwrap_err(),
            Error::limit("max_payload_len", 99)
        );
    }

    #[test]
    fn unknown_dictionary_text_id() {
        assert_eq!(
            decode_bytes(&[0xAA, 0xFF, 0x7F]).unwrap_err(),
            Error::UnknownDictionaryIndex(0x3FFF)
        );
    }

    #[test]
    fn bool_text_rejects_other_bytes() {
        assert_eq!(decode_bytes(&[0xB4, 0x01]).unwrap(), Value::Bool(true));
        assert!(matches!(decode_bytes(&[0xB4, 0x02]), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn non_text_tag_is_unsupported() {
        assert_eq!(decode_bytes(&[0x40]).unwrap_err(), Error::UnsupportedRecordType(0x40));
        assert_eq!(decode_bytes(&[0xA6]).unwrap_err(), Error::UnsupportedRecordType(0xA6));
    }

    #[test]
    fn array_is_not_a_text_value() {
        let mut w = ByteWriter::new();
        let v = Value::Array(ArrayValue::Int32(vec![1]));
        assert!(matches!(encode_value(&mut w, &v, false, true), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn array_layout_and_round_trip() {
        let arr = ArrayValue::Int32(vec![1, 2]);
        let mut w = ByteWriter::new();
        encode_array(&mut w, &arr).unwrap();
        let data = w.into_vec();
        assert_eq!(data, vec![0x8D, 0x02, 1, 0, 0, 0, 2, 0, 0, 0]);
        let mut r = ByteReader::new(&data);
        assert_eq!(decode_array(&mut r, &Limits::default()).unwrap(), arr);
    }

    #[test]
    fn out_of_range_decimal_and_datetime_rejected() {
        let wide = Decimal { scale: 0, negative: false, mantissa: 1 << 100 };
        let late = DateTime { ticks: u64::MAX >> 1, kind: DateTimeKind::Unspecified };
        let mut w = ByteWriter::new();
        assert!(matches!(encode_value(&mut w, &Value::Decimal(wide), true, true), Err(Error::InvalidValue(_))));
        assert!(matches!(encode_value(&mut w, &Value::DateTime(late), true, true), Err(Error::InvalidValue(_))));
        assert!(matches!(encode_array(&mut w, &ArrayValue::Decimal(vec![wide])), Err(Error::InvalidValue(_))));
        assert!(matches!(encode_array(&mut w, &ArrayValue::DateTime(vec![late])), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn array_of_every_item_type() {
        let dt = DateTime::new(42, DateTimeKind::Local).unwrap();
        let arrays = [
            ArrayValue::Bool(vec![true, false]),
            ArrayValue::Int16(vec![-1, 300]),
            ArrayValue::Int64(vec![i64::MAX]),
            ArrayValue::Float(vec![0.5]),
            ArrayValue::Double(vec![1e10, -0.25]),
            ArrayValue::Decimal(vec![Decimal::new(1, 1, false).unwrap()]),
            ArrayValue::DateTime(vec![dt]),
            ArrayValue::TimeSpan(vec![-5, 5]),
            ArrayValue::Guid(vec![[1; 16], [2; 16]]),
        ];
        for arr in &arrays {
            let mut w = ByteWriter::new();
            encode_array(&mut w, arr).unwrap();
            let data = w.into_vec();
            let mut r = ByteReader::new(&data);
            assert_eq!(&decode_array(&mut r, &Limits::default()).unwrap(), arr);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn array_count_beyond_input_is_truncated() {
        // 1000 Int64-Items angekündigt, keine Daten
        let data = [0x8F, 0xE8, 0x07];
        let mut r = ByteReader::new(&data);
        assert_eq!(decode_array(&mut r, &Limits::default()).unwrap_err(), Error::TruncatedInput);
    }

    #[test]
    fn array_item_type_checks() {
        // Chars8TextWithEndElement ist kein Array-Typ
        let mut r = ByteReader::new(&[0x99, 0x00]);
        assert_eq!(
            decode_array(&mut r, &Limits::default()).unwrap_err(),
            Error::UnsupportedRecordType(0x99)
        );
        // Int32Text ohne End-Element-Flag
        let mut r = ByteReader::new(&[0x8C, 0x00]);
        assert!(matches!(
            decode_array(&mut r, &Limits::default()),
            Err(Error::MalformedRecordSequence { .. })
        ));
    }

    #[test]
    fn item_widths() {
        assert_eq!(array_item_width(0xB5), Some(1));
        assert_eq!(array_item_width(0x8B), Some(2));
        assert_eq!(array_item_width(0x95), Some(16));
        assert_eq!(array_item_width(0xB1), Some(16));
        assert_eq!(array_item_width(0x89), None);
    }
}
