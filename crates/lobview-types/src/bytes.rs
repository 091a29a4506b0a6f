//! Bounds-checked cursor over little-endian fixed-layout bytes.
//!
//! Every read names the region it belongs to so a short buffer reports
//! *where* it ran out, not just that it did.

use crate::{LobviewError, Pubkey, Result};

/// Forward-only reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    region: &'static str,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8], region: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            region,
        }
    }

    /// Current offset from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(LobviewError::BufferTooShort {
                region: self.region,
                needed: self.pos.saturating_add(len),
                available: self.buf.len(),
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array::<8>().map(u64::from_le_bytes)
    }

    pub fn read_pubkey(&mut self) -> Result<Pubkey> {
        self.read_array::<32>().map(Pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        bytes.extend_from_slice(&42u64.to_le_bytes());
        let mut reader = ByteReader::new(&bytes, "test");

        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u64().unwrap(), 42);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn short_read_reports_region() {
        let bytes = [0u8; 6];
        let mut reader = ByteReader::new(&bytes, "header");
        reader.skip(4).unwrap();

        let err = reader.read_u64().unwrap_err();
        assert_eq!(
            err,
            LobviewError::BufferTooShort {
                region: "header",
                needed: 12,
                available: 6,
            }
        );
        // A failed read does not move the cursor.
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn take_overflowing_length_is_an_error() {
        let bytes = [0u8; 4];
        let mut reader = ByteReader::new(&bytes, "test");
        reader.skip(1).unwrap();
        assert!(reader.take(usize::MAX).is_err());
    }
}
