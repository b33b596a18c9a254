use crate::error::Result;
use crate::node::Node;
use crate::options::CodecOptions;

use super::{DecodeIter, Decoder};

/// Erstellt einen Decode-Iterator mit Default-Limits.
pub fn decode_iter(data: &[u8]) -> DecodeIter<'_> {
    DecodeIter::new(Decoder::new(data))
}

/// Erstellt einen Decode-Iterator mit externen Options.
pub fn decode_iter_with_options<'a>(
    data: &'a [u8],
    options: &CodecOptions,
) -> Result<DecodeIter<'a>> {
    Ok(DecodeIter::new(Decoder::with_options(data, options)?))
}

// ============================================================================
// High-Level API
// ============================================================================

/// Decodiert eine Nachricht zu einer Node-Sequenz.
///
/// Die Sequenz endet immer mit [`Node::EndOfDocument`].
pub fn decode(data: &[u8]) -> Result<Vec<Node>> {
    decode_with_options(data, &CodecOptions::default())
}

/// Decodiert eine Nachricht mit expliziten Limits.
pub fn decode_with_options(data: &[u8], options: &CodecOptions) -> Result<Vec<Node>> {
    decode_iter_with_options(data, options)?.collect()
}

/// Decodiert eine Session-Nachricht: String-Table-Block, dann der Body.
///
/// Die Strings des Blocks erhalten die Session-Ids 1, 3, 5, ... in
/// Reihenfolge.
pub fn decode_session_message(data: &[u8], options: &CodecOptions) -> Result<Vec<Node>> {
    let mut decoder = Decoder::with_options(data, options)?;
    decoder.read_string_table()?;
    DecodeIter::new(decoder).collect()
}
