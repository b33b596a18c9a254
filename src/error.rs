//! Central error types for the binary XML codec.
//!
//! Every variant is terminal for the current encode/decode call: the session
//! dictionary and the element stack are no longer trustworthy afterwards.

use core::fmt;
use std::borrow::Cow;

/// All errors raised by the record encoder/decoder and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The stream ended before a declared length was satisfied.
    TruncatedInput,
    /// A MultiByteInt31 exceeded its 31-bit domain.
    IntegerOverflow,
    /// A dictionary string id has no entry in the static or session table.
    UnknownDictionaryIndex(u32),
    /// The tag byte is not part of the record grammar.
    UnsupportedRecordType(u8),
    /// The record is legal in the grammar but not in the current decoder/encoder state.
    MalformedRecordSequence {
        /// Der Record/Node der nicht passte.
        record: Cow<'static, str>,
        /// Der Zustand in dem der Fehler auftrat.
        state: Cow<'static, str>,
    },
    /// EndElement without a matching open element.
    UnbalancedElement,
    /// End of stream with elements still open (or without any root element).
    TruncatedDocument,
    /// A configured bound was exceeded.
    ResourceLimitExceeded {
        /// Name des Limits (z.B. "max_nodes").
        limit: &'static str,
        /// Konfigurierter Maximalwert.
        max: u64,
    },
    /// A namespace prefix is used without an in-scope declaration.
    UnresolvedPrefix(String),
    /// A text payload is not valid UTF-8 / UTF-16.
    InvalidText(String),
    /// A value or node has no legal wire form.
    InvalidValue(String),
    /// XML parsing failed (textual collaborator).
    XmlParseError(String),
    /// Ein IO-Fehler beim Schreiben der Ausgabe.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput => write!(f, "truncated input: stream ended inside a record"),
            Self::IntegerOverflow => write!(f, "integer overflow: MultiByteInt31 exceeds 31 bits"),
            Self::UnknownDictionaryIndex(id) => write!(f, "unknown dictionary string id {id}"),
            Self::UnsupportedRecordType(tag) => write!(f, "unsupported record type 0x{tag:02X}"),
            Self::MalformedRecordSequence { record, state } => {
                if state.is_empty() {
                    write!(f, "malformed record sequence: unexpected {record}")
                } else {
                    write!(f, "malformed record sequence: unexpected {record} in state {state}")
                }
            }
            Self::UnbalancedElement => write!(f, "unbalanced element: end element without open element"),
            Self::TruncatedDocument => write!(f, "truncated document: end of stream with open or missing root element"),
            Self::ResourceLimitExceeded { limit, max } => {
                write!(f, "resource limit exceeded: {limit} (max {max})")
            }
            Self::UnresolvedPrefix(prefix) => write!(f, "namespace prefix '{prefix}' is not declared"),
            Self::InvalidText(msg) => write!(f, "invalid text payload: {msg}"),
            Self::InvalidValue(msg) => write!(f, "invalid value: {msg}"),
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `MalformedRecordSequence` Fehler mit Kontext.
    pub fn malformed(record: impl Into<Cow<'static, str>>, state: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedRecordSequence {
            record: record.into(),
            state: state.into(),
        }
    }

    /// Erstellt einen `ResourceLimitExceeded` Fehler.
    pub fn limit(limit: &'static str, max: u64) -> Self {
        Self::ResourceLimitExceeded { limit, max }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
