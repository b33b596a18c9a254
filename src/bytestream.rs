//! Byte-level stream reader and writer for the record grammar.
//!
//! All fixed-width numbers in this format are little-endian. Reads never
//! advance past the end of the input: a short read returns
//! [`Error::TruncatedInput`] and leaves the cursor where it was.

use crate::{Error, Result};

/// Reads bytes and little-endian numbers from a borrowed slice.
#[derive(Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    /// Nächstes ungelesenes Byte in data.
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads a single byte.
    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(Error::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Liest das nächste Byte ohne den Lesezeiger zu bewegen.
    #[inline]
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads `n` bytes and returns them as a slice of the input (no copy).
    #[inline]
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::TruncatedInput)?;
        if end > self.data.len() {
            return Err(Error::TruncatedInput);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads exactly `N` bytes into an array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Returns the current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True wenn alle Bytes gelesen wurden.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Writes bytes and little-endian numbers into a growable buffer.
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty `ByteWriter`.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    #[inline(always)]
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u16(&mut self, val: u16) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_u64(&mut self, val: u64) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_i8(&mut self, val: i8) {
        self.write_u8(val as u8);
    }

    pub fn write_i16(&mut self, val: i16) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_i32(&mut self, val: i32) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_i64(&mut self, val: i64) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_f32(&mut self, val: f32) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_f64(&mut self, val: f64) {
        self.write_bytes(&val.to_le_bytes());
    }

    /// Gibt die aktuelle Buffer-Größe in Bytes zurück.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns a reference to the written bytes so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finalises the writer and returns the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_round_trip() {
        let mut w = ByteWriter::new();
        w.write_u16(0x1234);
        w.write_i32(-2);
        w.write_u64(0x0102_0304_0506_0708);
        w.write_f64(1.5);
        let data = w.into_vec();
        assert_eq!(&data[..2], &[0x34, 0x12]);
        assert_eq!(&data[2..6], &[0xFE, 0xFF, 0xFF, 0xFF]);

        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_i32().unwrap(), -2);
        assert_eq!(r.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_leaves_cursor() {
        let data = [0x01, 0x02, 0x03];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u32().unwrap_err(), Error::TruncatedInput);
        assert_eq!(r.position(), 1);
        assert_eq!(r.remaining(), 2);
        assert_eq!(r.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn read_bytes_borrows_input() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut r = ByteReader::new(&data);
        let slice = r.read_bytes(2).unwrap();
        assert_eq!(slice, &[0xAA, 0xBB]);
        assert_eq!(r.peek_u8(), Some(0xCC));
        assert_eq!(r.read_bytes(2).unwrap_err(), Error::TruncatedInput);
    }

    #[test]
    fn read_empty_stream() {
        let mut r = ByteReader::new(&[]);
        assert_eq!(r.read_u8().unwrap_err(), Error::TruncatedInput);
        assert_eq!(r.peek_u8(), None);
    }
}
