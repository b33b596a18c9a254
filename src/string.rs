//! String payloads of the record grammar.
//!
//! - `String`: MultiByteInt31 byte length followed by UTF-8 bytes
//! - `DictionaryString`: MultiByteInt31 wire id (see [`crate::dictionary`])
//! - UTF-16LE payloads of the `UnicodeChars*Text` records

use std::rc::Rc;

use crate::bytestream::{ByteReader, ByteWriter};
use crate::dictionary::DictRef;
use crate::options::Limits;
use crate::{Error, Result, multi_byte_int};

/// Encodes a `String` (MB31 byte length + UTF-8).
pub fn encode(writer: &mut ByteWriter, value: &str) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| Error::IntegerOverflow)?;
    multi_byte_int::encode(writer, len)?;
    writer.write_bytes(value.as_bytes());
    Ok(())
}

/// Decodes a `String`.
pub fn decode(reader: &mut ByteReader, limits: &Limits) -> Result<Rc<str>> {
    let len = multi_byte_int::decode(reader)? as usize;
    limits.check_payload(len)?;
    decode_utf8(reader.read_bytes(len)?)
}

/// Encodes a `DictionaryString` wire id.
#[inline]
pub fn encode_dict(writer: &mut ByteWriter, id: u32) -> Result<()> {
    multi_byte_int::encode(writer, id)
}

/// Decodes a `DictionaryString` wire id.
#[inline]
pub fn decode_dict(reader: &mut ByteReader) -> Result<DictRef> {
    Ok(DictRef::Index(multi_byte_int::decode(reader)?))
}

/// UTF-8 Payload → `Rc<str>`.
pub fn decode_utf8(bytes: &[u8]) -> Result<Rc<str>> {
    std::str::from_utf8(bytes)
        .map(Rc::from)
        .map_err(|e| Error::InvalidText(format!("invalid UTF-8: {e}")))
}

/// UTF-16LE Payload → `Rc<str>`.
///
/// Ungerade Länge oder ungepaarte Surrogates sind ein Fehler.
pub fn decode_utf16le(bytes: &[u8]) -> Result<Rc<str>> {
    if !bytes.len().is_multiple_of(2) {
        return Err(Error::InvalidText(format!(
            "UTF-16 payload has odd length {}",
            bytes.len()
        )));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let s: String = char::decode_utf16(units)
        .collect::<core::result::Result<_, _>>()
        .map_err(|e| Error::InvalidText(format!("invalid UTF-16: {e}")))?;
    Ok(Rc::from(s))
}

/// `&str` → UTF-16LE Bytes.
pub fn encode_utf16le(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() * 2);
    for unit in value.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}
