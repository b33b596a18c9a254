//! Decimal payloads (`DecimalText`).
//!
//! 16 bytes, laid out like the in-memory .NET decimal:
//!
//! ```text
//! u16 reserved | u8 scale | u8 sign (0x80 = negative) | u32 hi | u64 lo
//! ```
//!
//! The value is `(hi:lo) / 10^scale` with a 96-bit mantissa and a scale of at
//! most 28. Trailing zeros are significant (`1.50` keeps scale 2).

use std::fmt;
use std::str::FromStr;

use crate::bytestream::{ByteReader, ByteWriter};
use crate::{Error, Result};

/// Größte erlaubte Skalierung.
pub const MAX_SCALE: u8 = 28;
/// Largest 96-bit mantissa.
pub const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// A 96-bit scaled decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    /// Number of digits after the decimal point.
    pub scale: u8,
    /// True if the sign bit is set (including negative zero).
    pub negative: bool,
    /// Unscaled magnitude, at most 96 bits.
    pub mantissa: u128,
}

impl Decimal {
    /// Creates a decimal after range checks.
    pub fn new(mantissa: u128, scale: u8, negative: bool) -> Result<Self> {
        if scale > MAX_SCALE {
            return Err(Error::InvalidValue(format!("decimal scale {scale} exceeds {MAX_SCALE}")));
        }
        if mantissa > MAX_MANTISSA {
            return Err(Error::InvalidValue("decimal mantissa exceeds 96 bits".into()));
        }
        Ok(Self { scale, negative, mantissa })
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }
}

/// Plain decimal notation; negative zero prints as `0`.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = usize::from(self.scale);
        if self.negative && !self.is_zero() {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

/// Parst `[-+]digits[.digits]`.
impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidValue(format!("invalid decimal '{s}'"));
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int, frac) = rest.split_once('.').unwrap_or((rest, ""));
        if (int.is_empty() && frac.is_empty())
            || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let scale = u8::try_from(frac.len()).map_err(|_| invalid())?;
        let mut mantissa: u128 = 0;
        for b in int.bytes().chain(frac.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        Self::new(mantissa, scale, negative)
    }
}

/// Encodes a `DecimalText` payload.
///
/// Die Felder sind öffentlich; Scale und Mantisse werden hier erneut geprüft.
pub fn encode(writer: &mut ByteWriter, value: &Decimal) -> Result<()> {
    Decimal::new(value.mantissa, value.scale, value.negative)?;
    writer.write_u16(0);
    writer.write_u8(value.scale);
    writer.write_u8(if value.negative { 0x80 } else { 0x00 });
    writer.write_u32((value.mantissa >> 64) as u32);
    writer.write_u64(value.mantissa as u64);
    Ok(())
}

/// Decodes a `DecimalText` payload.
pub fn decode(reader: &mut ByteReader) -> Result<Decimal> {
    // Reserved-Feld wird ignoriert
    let _reserved = reader.read_u16()?;
    let scale = reader.read_u8()?;
    let sign = reader.read_u8()?;
    let hi = reader.read_u32()?;
    let lo = reader.read_u64()?;
    if sign & 0x7F != 0 {
        return Err(Error::InvalidValue(format!("decimal sign byte 0x{sign:02X}")));
    }
    Decimal::new((u128::from(hi) << 64) | u128::from(lo), scale, sign & 0x80 != 0)
}
