//! Big-endian cursor over class file bytes.

/// A class file could not be parsed.
///
/// The offset is the position in the class file bytes where the problem was
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at offset {offset:#x}")]
pub struct ClassFormatError {
    offset: usize,
    reason: String,
}

impl ClassFormatError {
    /// Creates an error at `offset`.
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset where parsing failed.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// What went wrong.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

pub(crate) type ParseResult<T> = std::result::Result<T, ClassFormatError>;

/// Bounds-checked reader with a position cursor.
///
/// All multi-byte reads are big-endian, as everywhere in the class file
/// format.
#[derive(Debug)]
pub(crate) struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset.
    pub(crate) fn pos(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Builds an error at the current offset.
    pub(crate) fn error(&self, reason: impl Into<String>) -> ClassFormatError {
        ClassFormatError::new(self.position, reason)
    }

    pub(crate) fn read_bytes(&mut self, len: usize, what: &str) -> ParseResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.error(format!(
                "truncated {}: need {} bytes, {} left",
                what,
                len,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> ParseResult<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    pub(crate) fn read_u16(&mut self, what: &str) -> ParseResult<u16> {
        let b = self.read_bytes(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> ParseResult<u32> {
        let b = self.read_bytes(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_u64(&mut self, what: &str) -> ParseResult<u64> {
        let b = self.read_bytes(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_be_bytes(buf))
    }
}
