//! Little-endian cursor over a fixed-field event payload.

use thiserror::Error;

/// Payload decode failure. One failing entry never aborts its record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload ended early: wanted {wanted} more bytes, {remaining} remaining")]
    UnexpectedEnd { wanted: usize, remaining: usize },
    #[error("invalid side flag {0}")]
    InvalidSideFlag(u8),
}

/// Sequential reader over a payload body (the bytes after the 8-byte
/// discriminator). All multi-byte fields are little-endian.
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        PayloadReader { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Any nonzero byte reads as true, matching the on-chain flag encoding.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(arr))
    }

    /// Read a 32-byte account key.
    pub fn read_key(&mut self) -> Result<[u8; 32], DecodeError> {
        let bytes = self.take(32)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_sequence() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[7u8; 32]);
        buf.push(1);
        buf.extend_from_slice(&42u64.to_le_bytes());
        buf.extend_from_slice(&(-5i64).to_le_bytes());

        let mut reader = PayloadReader::new(&buf);
        assert_eq!(reader.read_key().unwrap(), [7u8; 32]);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_u64().unwrap(), 42);
        assert_eq!(reader.read_i64().unwrap(), -5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_unexpected_end() {
        let buf = [1u8, 2, 3];
        let mut reader = PayloadReader::new(&buf);
        let err = reader.read_u64().unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnexpectedEnd {
                wanted: 8,
                remaining: 3
            }
        );
    }

    #[test]
    fn test_little_endian_u64() {
        let buf = 0x0102030405060708u64.to_le_bytes();
        let mut reader = PayloadReader::new(&buf);
        assert_eq!(reader.read_u64().unwrap(), 0x0102030405060708);
    }
}
