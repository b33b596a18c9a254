//! Codec options: resource limits for decoding and encoding.
//!
//! The wire format itself has no negotiated options. What remains
//! configurable are the bounds a decoder enforces against well-formed but
//! hostile input.
//!
//! # Beispiel
//!
//! ```
//! use nbfs::{CodecOptions, Limits};
//!
//! let opts = CodecOptions::default()
//!     .with_max_depth(32)
//!     .with_max_payload_len(4096);
//!
//! assert_eq!(opts.limits().max_depth, Some(32));
//! assert_eq!(opts.limits().max_payload_len, Some(4096));
//! assert_eq!(Limits::unbounded().max_nodes, None);
//! ```

use log::warn;

use crate::{Error, Result};

/// Upper bounds enforced during one encode/decode call.
///
/// `None` disables the respective check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of nodes produced (decoder) or consumed (encoder).
    pub max_nodes: Option<u64>,
    /// Maximum element nesting depth.
    pub max_depth: Option<usize>,
    /// Maximum byte length of a single length-prefixed payload or array.
    pub max_payload_len: Option<usize>,
    /// Maximum number of session dictionary entries (read from a string
    /// table or interned by the session encoder).
    pub max_dictionary_entries: Option<usize>,
}

impl Default for Limits {
    /// Großzügige Defaults: normale SOAP-Nachrichten liegen weit darunter.
    fn default() -> Self {
        Self {
            max_nodes: Some(10_000_000),
            max_depth: Some(1_024),
            max_payload_len: Some(64 * 1024 * 1024),
            max_dictionary_entries: Some(65_536),
        }
    }
}

impl Limits {
    /// Disables every limit.
    pub fn unbounded() -> Self {
        Self {
            max_nodes: None,
            max_depth: None,
            max_payload_len: None,
            max_dictionary_entries: None,
        }
    }

    /// Prüft eine Payload-Länge gegen `max_payload_len`.
    #[inline]
    pub fn check_payload(&self, len: usize) -> Result<()> {
        match self.max_payload_len {
            Some(max) if len > max => Err(exceeded("max_payload_len", max as u64, len as u64)),
            _ => Ok(()),
        }
    }

    /// Prüft die Verschachtelungstiefe gegen `max_depth`.
    #[inline]
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        match self.max_depth {
            Some(max) if depth > max => Err(exceeded("max_depth", max as u64, depth as u64)),
            _ => Ok(()),
        }
    }

    /// Prüft die Anzahl Nodes gegen `max_nodes`.
    #[inline]
    pub fn check_nodes(&self, count: u64) -> Result<()> {
        match self.max_nodes {
            Some(max) if count > max => Err(exceeded("max_nodes", max, count)),
            _ => Ok(()),
        }
    }
}

fn exceeded(limit: &'static str, max: u64, actual: u64) -> Error {
    warn!("resource limit {limit} exceeded: {actual} > {max}");
    Error::limit(limit, max)
}

/// Options for one decode or encode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecOptions {
    pub(crate) limits: Limits,
}

impl CodecOptions {
    // --- Getter ---

    /// Resource limits.
    pub fn limits(&self) -> &Limits { &self.limits }

    // --- Builder ---

    /// Replaces all limits.
    pub fn with_limits(mut self, limits: Limits) -> Self { self.limits = limits; self }
    /// Sets `max_nodes`.
    pub fn with_max_nodes(mut self, max: u64) -> Self { self.limits.max_nodes = Some(max); self }
    /// Sets `max_depth`.
    pub fn with_max_depth(mut self, max: usize) -> Self { self.limits.max_depth = Some(max); self }
    /// Sets `max_payload_len`.
    pub fn with_max_payload_len(mut self, max: usize) -> Self { self.limits.max_payload_len = Some(max); self }
    /// Sets `max_dictionary_entries`.
    pub fn with_max_dictionary_entries(mut self, max: usize) -> Self { self.limits.max_dictionary_entries = Some(max); self }

    // --- Setter ---

    pub fn set_limits(&mut self, limits: Limits) { self.limits = limits; }

    /// Validiert die Optionen.
    ///
    /// Eine maximale Tiefe von 0 würde jedes Dokument ablehnen (es gibt immer
    /// ein Root-Element).
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_depth == Some(0) {
            return Err(Error::InvalidValue("max_depth must be at least 1".into()));
        }
        if self.limits.max_nodes == Some(0) {
            return Err(Error::InvalidValue("max_nodes must be at least 1".into()));
        }
        Ok(())
    }
}
