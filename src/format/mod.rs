//! Zip archive format constants and low-level record parsing.
//!
//! jar, aar and zip files share the same physical layout: a sequence of
//! local file headers each followed by its payload, then the central
//! directory, then the end-of-central-directory record (EOCD). Only the
//! classic 32-bit layout on a single disk is supported.

pub mod header;
pub mod reader;

/// Local file header signature (`PK\x03\x04`).
pub const SIG_LOCAL_HEADER: u32 = 0x0403_4b50;

/// Central directory file header signature (`PK\x01\x02`).
pub const SIG_CENTRAL_HEADER: u32 = 0x0201_4b50;

/// End of central directory signature (`PK\x05\x06`).
pub const SIG_END_OF_CENTRAL_DIR: u32 = 0x0605_4b50;

/// Fixed length of a local file header.
pub const LOCAL_HEADER_LEN: usize = 30;

/// Fixed length of a central directory file header.
pub const CENTRAL_HEADER_LEN: usize = 46;

/// Fixed length of the EOCD record, without its comment.
pub const EOCD_LEN: usize = 22;

/// How far from the end of the file the EOCD may start.
///
/// The record may be followed by a comment of up to 65535 bytes.
pub const EOCD_SEARCH_MAX: usize = EOCD_LEN + u16::MAX as usize;

/// General purpose flag bits.
pub mod flags {
    /// Entry is encrypted.
    pub const ENCRYPTED: u16 = 0x0001;
    /// Sizes and CRC follow the payload in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 0x0008;
    /// Name and comment are UTF-8.
    pub const UTF8_NAMES: u16 = 0x0800;
}

/// Version needed to extract a stored or deflated entry (2.0).
pub const VERSION_DEFLATE: u16 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_spell_pk() {
        assert_eq!(&SIG_LOCAL_HEADER.to_le_bytes(), b"PK\x03\x04");
        assert_eq!(&SIG_CENTRAL_HEADER.to_le_bytes(), b"PK\x01\x02");
        assert_eq!(&SIG_END_OF_CENTRAL_DIR.to_le_bytes(), b"PK\x05\x06");
    }
}
