//! DateTime and TimeSpan payloads.
//!
//! A `DateTimeText` payload is one little-endian u64: the low 62 bits count
//! 100 ns ticks since 0001-01-01T00:00:00 (proleptic Gregorian), the top two
//! bits carry the [`DateTimeKind`]. A `TimeSpanText` payload is a signed
//! 64-bit tick count.

use std::fmt;

use crate::bytestream::{ByteReader, ByteWriter};
use crate::{Error, Result};

/// Ticks pro Sekunde (100 ns Auflösung).
pub const TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_DAY: u64 = TICKS_PER_SECOND * 86_400;
/// Largest tick value (9999-12-31T23:59:59.9999999).
pub const MAX_TICKS: u64 = 3_155_378_975_999_999_999;
const TICKS_MASK: u64 = (1 << 62) - 1;
/// Tage von 0001-01-01 bis 1970-01-01.
const DAYS_TO_UNIX_EPOCH: i64 = 719_162;

/// Time zone interpretation of a [`DateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateTimeKind {
    #[default]
    Unspecified = 0,
    Utc = 1,
    Local = 2,
}

impl DateTimeKind {
    fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::Utc),
            2 => Ok(Self::Local),
            _ => Err(Error::InvalidValue(format!("date-time kind {bits}"))),
        }
    }
}

/// Date and time with 100 ns precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    /// Ticks since 0001-01-01T00:00:00.
    pub ticks: u64,
    pub kind: DateTimeKind,
}

impl DateTime {
    /// Creates a date-time from ticks; ticks beyond 9999-12-31 are rejected.
    pub fn new(ticks: u64, kind: DateTimeKind) -> Result<Self> {
        if ticks > MAX_TICKS {
            return Err(Error::InvalidValue(format!("date-time ticks {ticks} out of range")));
        }
        Ok(Self { ticks, kind })
    }

    /// Erstellt einen DateTime aus Kalenderkomponenten.
    ///
    /// `fraction` sind Ticks innerhalb der Sekunde (0..10_000_000).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        year: i64,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        fraction: u64,
        kind: DateTimeKind,
    ) -> Result<Self> {
        if !(1..=9999).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
            || fraction >= TICKS_PER_SECOND
        {
            return Err(Error::InvalidValue(format!(
                "invalid date-time {year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
            )));
        }
        let days = (days_from_civil(year, month, day) + DAYS_TO_UNIX_EPOCH) as u64;
        let secs = u64::from(hour * 3600 + minute * 60 + second);
        Self::new(days * TICKS_PER_DAY + secs * TICKS_PER_SECOND + fraction, kind)
    }

    /// (year, month, day, hour, minute, second, fraction ticks)
    pub fn components(&self) -> (i64, u32, u32, u32, u32, u32, u64) {
        let days = (self.ticks / TICKS_PER_DAY) as i64;
        let rem = self.ticks % TICKS_PER_DAY;
        let (year, month, day) = civil_from_days(days - DAYS_TO_UNIX_EPOCH);
        let secs = (rem / TICKS_PER_SECOND) as u32;
        let fraction = rem % TICKS_PER_SECOND;
        (year, month, day, secs / 3600, secs / 60 % 60, secs % 60, fraction)
    }
}

/// ISO-8601: `yyyy-MM-ddTHH:mm:ss[.fffffff][Z]`, trailing fraction zeros trimmed.
///
/// `Local` wird ohne Offset ausgegeben: der Offset des erzeugenden Rechners
/// ist im Binärformat nicht enthalten.
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, mo, d, h, mi, s, frac) = self.components();
        write!(f, "{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}")?;
        write_fraction(f, frac)?;
        if self.kind == DateTimeKind::Utc {
            f.write_str("Z")?;
        }
        Ok(())
    }
}

fn write_fraction(f: &mut impl fmt::Write, frac: u64) -> fmt::Result {
    if frac == 0 {
        return Ok(());
    }
    let digits = format!("{frac:07}");
    write!(f, ".{}", digits.trim_end_matches('0'))
}

/// Encodes a `DateTimeText` payload.
pub fn encode(writer: &mut ByteWriter, value: &DateTime) -> Result<()> {
    DateTime::new(value.ticks, value.kind)?;
    writer.write_u64(value.ticks | ((value.kind as u64) << 62));
    Ok(())
}

/// Decodes a `DateTimeText` payload.
pub fn decode(reader: &mut ByteReader) -> Result<DateTime> {
    let raw = reader.read_u64()?;
    let kind = DateTimeKind::from_bits(raw >> 62)?;
    DateTime::new(raw & TICKS_MASK, kind)
}

/// Formats a time span as `xs:duration` (`-P1DT2H3M4.5S`, zero = `PT0S`).
pub fn format_time_span(ticks: i64) -> String {
    if ticks == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::new();
    if ticks < 0 {
        out.push('-');
    }
    let abs = ticks.unsigned_abs();
    let days = abs / TICKS_PER_DAY;
    let rem = abs % TICKS_PER_DAY;
    let secs = rem / TICKS_PER_SECOND;
    let frac = rem % TICKS_PER_SECOND;
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);

    out.push('P');
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || frac > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || frac > 0 {
            out.push_str(&seconds.to_string());
            // String implementiert fmt::Write, kann nicht fehlschlagen
            let _ = write_fraction(&mut out, frac);
            out.push('S');
        }
    }
    out
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Tage seit 1970-01-01 → (Jahr, Monat, Tag), proleptisch gregorianisch.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// (Jahr, Monat, Tag) → Tage seit 1970-01-01.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
