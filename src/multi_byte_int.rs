//! MultiByteInt31: the variable-length unsigned integer of the record grammar.
//!
//! Each octet carries 7 data bits, least significant group first; the high bit
//! is the continuation flag. At most 5 octets are used and the fifth may only
//! contribute the remaining 3 bits, which bounds the domain to `0..=0x7FFF_FFFF`.

use crate::bytestream::{ByteReader, ByteWriter};
use crate::{Error, Result};

/// Largest value representable as MultiByteInt31.
pub const MAX: u32 = 0x7FFF_FFFF;

/// Encodes `value` as MultiByteInt31.
///
/// Returns [`Error::IntegerOverflow`] for values above [`MAX`].
#[inline]
pub fn encode(writer: &mut ByteWriter, value: u32) -> Result<()> {
    if value > MAX {
        return Err(Error::IntegerOverflow);
    }
    if value < 0x80 {
        // Fast-Path: Single-Byte (häufigster Fall: kurze Längen, kleine Dictionary-IDs)
        writer.write_u8(value as u8);
        return Ok(());
    }
    let mut v = value;
    while v >= 0x80 {
        writer.write_u8((v & 0x7F) as u8 | 0x80);
        v >>= 7;
    }
    writer.write_u8(v as u8);
    Ok(())
}

/// Decodes a MultiByteInt31.
#[inline]
pub fn decode(reader: &mut ByteReader) -> Result<u32> {
    let byte = reader.read_u8()?;
    if byte & 0x80 == 0 {
        return Ok(u32::from(byte));
    }
    let mut result = u32::from(byte & 0x7F);
    for shift in [7u32, 14, 21] {
        let byte = reader.read_u8()?;
        result |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    // 5. Byte: nur 3 Daten-Bits erlaubt, keine Continuation
    let byte = reader.read_u8()?;
    if byte > 0x07 {
        return Err(Error::IntegerOverflow);
    }
    Ok(result | (u32::from(byte) << 28))
}

/// Number of octets `value` occupies on the wire.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}
