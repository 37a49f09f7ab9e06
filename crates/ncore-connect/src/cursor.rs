//! Cursor over a serialized configuration region
//!
//! Parameter blocks are packed back to back as little-endian 32-bit words.
//! Readers copy one fixed-size record at a time and move past it; nothing
//! ever seeks backwards.

use crate::error::{ConnectError, Result};

/// A record with a fixed little-endian wire layout
pub trait FixedRecord: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] bytes
    fn decode(bytes: &[u8]) -> Self;

    /// Append the encoded form to `out`
    fn encode(&self, out: &mut Vec<u8>);
}

/// Read the little-endian `u32` at word `index` of `bytes`
#[inline]
pub(crate) fn word(bytes: &[u8], index: usize) -> u32 {
    let at = index * 4;
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Monotonically advancing read position over a configuration region
#[derive(Debug, Clone)]
pub struct ConfigCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ConfigCursor<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether the whole region has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Copy the next record and advance past it
    pub fn read_record<R: FixedRecord>(&mut self) -> Result<R> {
        let bytes = self.take(R::SIZE)?;
        Ok(R::decode(bytes))
    }

    /// Read the next little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(word(bytes, 0))
    }

    /// Skip `n_bytes` without decoding them
    pub fn advance(&mut self, n_bytes: usize) -> Result<()> {
        self.take(n_bytes).map(|_| ())
    }

    fn take(&mut self, n_bytes: usize) -> Result<&'a [u8]> {
        if n_bytes > self.remaining() {
            return Err(ConnectError::Truncated {
                offset: self.position,
                needed: n_bytes,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += n_bytes;
        Ok(&self.data[start..self.position])
    }
}

/// Builder for configuration regions
#[derive(Debug, Default, Clone)]
pub struct RecordWriter {
    bytes: Vec<u8>,
}

impl RecordWriter {
    /// Create an empty region
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push<R: FixedRecord>(&mut self, record: &R) -> &mut Self {
        record.encode(&mut self.bytes);
        self
    }

    /// Append a raw little-endian `u32`
    pub fn push_u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Finish and return the encoded region
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
