//! Typed text values.
//!
//! Text content and attribute values travel as typed records. [`Value`] is
//! the logical value after decoding: every signed integer tag (Zero, One,
//! Int8..Int64) normalizes to [`Value::Int`], dictionary text to
//! [`Value::Text`].

use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::datetime::{DateTime, format_time_span};
use crate::decimal::Decimal;
use crate::record::tag;

/// Logical value of a text record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `EmptyText`
    Empty,
    Bool(bool),
    /// Any signed integer width.
    Int(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(DateTime),
    /// Signed 100 ns ticks.
    TimeSpan(i64),
    /// `UuidText` (.NET GUID byte order).
    Guid([u8; 16]),
    /// `UniqueIdText`, rendered as `urn:uuid:...`.
    UniqueId([u8; 16]),
    Bytes(Vec<u8>),
    /// UTF-8 text (`Chars*Text`, `DictionaryText`).
    Text(Rc<str>),
    /// UTF-16 text (`UnicodeChars*Text`).
    UnicodeText(Rc<str>),
    /// `QNameDictionaryText`: prefix letter + local name.
    QName { prefix: Rc<str>, local: Rc<str> },
    /// `StartListText` ... `EndListText`.
    List(Vec<Value>),
    /// Payload of an `Array` record.
    Array(ArrayValue),
}

impl Value {
    /// UTF-8 text value.
    pub fn text(s: impl Into<Rc<str>>) -> Self {
        Self::Text(s.into())
    }

    /// Lexical XML form.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt64(u) => u.to_string(),
            Self::Float(f) => format_float(f64::from(*f), f.to_string()),
            Self::Double(d) => format_float(*d, d.to_string()),
            Self::Decimal(d) => d.to_string(),
            Self::DateTime(dt) => dt.to_string(),
            Self::TimeSpan(t) => format_time_span(*t),
            Self::Guid(g) => format_guid(g),
            Self::UniqueId(g) => format!("urn:uuid:{}", format_guid(g)),
            Self::Bytes(b) => STANDARD.encode(b),
            Self::Text(s) | Self::UnicodeText(s) => s.to_string(),
            Self::QName { prefix, local } => {
                if prefix.is_empty() {
                    local.to_string()
                } else {
                    format!("{prefix}:{local}")
                }
            }
            Self::List(items) => items.iter().map(Value::to_text).collect::<Vec<_>>().join(" "),
            Self::Array(arr) => arr.item_texts().join(" "),
        }
    }

    /// Variantenname für Fehlermeldungen.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::Decimal(_) => "Decimal",
            Self::DateTime(_) => "DateTime",
            Self::TimeSpan(_) => "TimeSpan",
            Self::Guid(_) => "Guid",
            Self::UniqueId(_) => "UniqueId",
            Self::Bytes(_) => "Bytes",
            Self::Text(_) => "Text",
            Self::UnicodeText(_) => "UnicodeText",
            Self::QName { .. } => "QName",
            Self::List(_) => "List",
            Self::Array(_) => "Array",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Rc::from(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// xs:float / xs:double Sonderwerte.
fn format_float(v: f64, plain: String) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "INF".to_string()
    } else if v == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        plain
    }
}

/// GUID in .NET byte order as `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn format_guid(g: &[u8; 16]) -> String {
    let d1 = u32::from_le_bytes([g[0], g[1], g[2], g[3]]);
    let d2 = u16::from_le_bytes([g[4], g[5]]);
    let d3 = u16::from_le_bytes([g[6], g[7]]);
    let mut out = format!("{d1:08x}-{d2:04x}-{d3:04x}-{:02x}{:02x}-", g[8], g[9]);
    for b in &g[10..] {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Homogeneous array payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(Vec<bool>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Decimal(Vec<Decimal>),
    DateTime(Vec<DateTime>),
    TimeSpan(Vec<i64>),
    Guid(Vec<[u8; 16]>),
}

impl ArrayValue {
    /// Anzahl Elemente.
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Decimal(v) => v.len(),
            Self::DateTime(v) => v.len(),
            Self::TimeSpan(v) => v.len(),
            Self::Guid(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item type tag (without end-element flag).
    pub fn item_tag(&self) -> u8 {
        match self {
            Self::Bool(_) => tag::BOOL_TEXT,
            Self::Int16(_) => tag::INT16_TEXT,
            Self::Int32(_) => tag::INT32_TEXT,
            Self::Int64(_) => tag::INT64_TEXT,
            Self::Float(_) => tag::FLOAT_TEXT,
            Self::Double(_) => tag::DOUBLE_TEXT,
            Self::Decimal(_) => tag::DECIMAL_TEXT,
            Self::DateTime(_) => tag::DATETIME_TEXT,
            Self::TimeSpan(_) => tag::TIMESPAN_TEXT,
            Self::Guid(_) => tag::UUID_TEXT,
        }
    }

    /// Each item as a scalar [`Value`].
    pub fn items(&self) -> Vec<Value> {
        match self {
            Self::Bool(v) => v.iter().map(|&b| Value::Bool(b)).collect(),
            Self::Int16(v) => v.iter().map(|&i| Value::Int(i64::from(i))).collect(),
            Self::Int32(v) => v.iter().map(|&i| Value::Int(i64::from(i))).collect(),
            Self::Int64(v) => v.iter().map(|&i| Value::Int(i)).collect(),
            Self::Float(v) => v.iter().map(|&f| Value::Float(f)).collect(),
            Self::Double(v) => v.iter().map(|&d| Value::Double(d)).collect(),
            Self::Decimal(v) => v.iter().map(|&d| Value::Decimal(d)).collect(),
            Self::DateTime(v) => v.iter().map(|&dt| Value::DateTime(dt)).collect(),
            Self::TimeSpan(v) => v.iter().map(|&t| Value::TimeSpan(t)).collect(),
            Self::Guid(v) => v.iter().map(|&g| Value::Guid(g)).collect(),
        }
    }

    /// Lexical form of each item.
    pub fn item_texts(&self) -> Vec<String> {
        self.items().iter().map(Value::to_text).collect()
    }
}
