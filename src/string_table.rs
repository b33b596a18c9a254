//! Session string table block.
//!
//! In the session encoding each message body is preceded by the strings it
//! adds to the session dictionary:
//!
//! ```text
//! MultiByteInt31 size | String* (exactly `size` bytes)
//! ```
//!
//! Every string is appended in order and receives the next odd wire id
//! (1, 3, 5, ...). The body records can then reference those ids.

use log::debug;

use crate::bytestream::{ByteReader, ByteWriter};
use crate::dictionary::Dictionary;
use crate::options::Limits;
use crate::{Result, multi_byte_int, string};

/// Reads one string table block and interns its entries.
///
/// Returns the number of strings added.
pub fn read_string_table(
    reader: &mut ByteReader,
    dictionary: &mut Dictionary,
    limits: &Limits,
) -> Result<usize> {
    let size = multi_byte_int::decode(reader)? as usize;
    limits.check_payload(size)?;
    let block = reader.read_bytes(size)?;
    let mut inner = ByteReader::new(block);
    let mut added = 0;
    while !inner.is_empty() {
        // Ein String der über die Blockgrenze hinausreicht → TruncatedInput
        let s = string::decode(&mut inner, limits)?;
        dictionary.intern_dynamic(&s)?;
        added += 1;
    }
    debug!(
        "string table: {added} strings, session dictionary now {} entries",
        dictionary.session().len()
    );
    Ok(added)
}

/// Writes one string table block.
pub fn write_string_table<'s>(
    writer: &mut ByteWriter,
    strings: impl IntoIterator<Item = &'s str>,
) -> Result<()> {
    let mut block = ByteWriter::new();
    for s in strings {
        string::encode(&mut block, s)?;
    }
    let size = u32::try_from(block.len()).map_err(|_| crate::Error::IntegerOverflow)?;
    multi_byte_int::encode(writer, size)?;
    writer.write_bytes(block.bytes());
    Ok(())
}
