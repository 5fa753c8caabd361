//! Modified UTF-8, the string encoding of `CONSTANT_Utf8` entries.
//!
//! It differs from standard UTF-8 in two ways: U+0000 is encoded as the two
//! bytes `C0 80`, and supplementary characters are encoded as a surrogate
//! pair with three bytes per surrogate.

/// Bytes that are not valid modified UTF-8, or a lone surrogate that has no
/// `String` representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid modified UTF-8 at byte {offset}")]
pub struct Mutf8Error {
    /// Offset of the first invalid byte.
    pub offset: usize,
}

/// Decodes modified UTF-8 bytes.
///
/// Class files may legally contain unpaired surrogates, which a `String`
/// cannot hold; they are reported as errors here. Use [`decode_lossy`] to
/// replace them instead.
///
/// ```
/// use sourcefile_fixer::classfile::mutf8;
///
/// assert_eq!(mutf8::decode(b"Foo.java").unwrap(), "Foo.java");
/// assert_eq!(mutf8::decode(&[0xC0, 0x80]).unwrap(), "\0");
/// ```
pub fn decode(bytes: &[u8]) -> Result<String, Mutf8Error> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        // Valid ASCII is valid UTF-8.
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }
    decode_units(bytes, false)
}

/// Decodes modified UTF-8 bytes, replacing invalid sequences and unpaired
/// surrogates with U+FFFD.
///
/// ```
/// use sourcefile_fixer::classfile::mutf8;
///
/// assert_eq!(mutf8::decode_lossy(&[0x41, 0xED, 0xA0, 0x80]), "A\u{FFFD}");
/// ```
pub fn decode_lossy(bytes: &[u8]) -> String {
    decode_units(bytes, true).unwrap_or_default()
}

fn decode_units(bytes: &[u8], lossy: bool) -> Result<String, Mutf8Error> {
    // (byte offset, UTF-16 code unit)
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        let continuation = |at: usize| match bytes.get(at) {
            Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
            _ => Err(Mutf8Error { offset: at }),
        };
        let (unit, len) = match b0 {
            0x01..=0x7F => (Ok(u16::from(b0)), 1),
            0xC0..=0xDF => (
                continuation(i + 1).map(|c1| (u16::from(b0 & 0x1F) << 6) | c1),
                2,
            ),
            0xE0..=0xEF => (
                continuation(i + 1).and_then(|c1| {
                    continuation(i + 2).map(|c2| (u16::from(b0 & 0x0F) << 12) | (c1 << 6) | c2)
                }),
                3,
            ),
            _ => (Err(Mutf8Error { offset: i }), 1),
        };
        match unit {
            Ok(unit) => {
                units.push((i, unit));
                i += len;
            }
            Err(_) if lossy => {
                units.push((i, 0xFFFD));
                i += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let mut out = String::with_capacity(units.len());
    let mut k = 0;
    while k < units.len() {
        let (at, unit) = units[k];
        let high = u32::from(unit);
        let c = match unit {
            0xD800..=0xDBFF => match units.get(k + 1) {
                Some(&(_, low @ 0xDC00..=0xDFFF)) => {
                    k += 1;
                    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (u32::from(low) - 0xDC00))
                }
                _ => None,
            },
            _ => char::from_u32(high),
        };
        match c {
            Some(c) => out.push(c),
            None if lossy => out.push(char::REPLACEMENT_CHARACTER),
            None => return Err(Mutf8Error { offset: at }),
        }
        k += 1;
    }
    Ok(out)
}

/// Encodes a string as modified UTF-8.
///
/// ```
/// use sourcefile_fixer::classfile::mutf8;
///
/// assert_eq!(mutf8::encode("A\0"), [0x41, 0xC0, 0x80]);
/// ```
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        assert_eq!(encode("Foo$Bar.kt"), b"Foo$Bar.kt");
        assert_eq!(decode(b"Foo$Bar.kt").unwrap(), "Foo$Bar.kt");
    }

    #[test]
    fn test_two_and_three_byte_forms() {
        // U+00E9 and U+4E16 have the same encoding as standard UTF-8.
        assert_eq!(encode("é世"), "é世".as_bytes());
        assert_eq!(decode("é世".as_bytes()).unwrap(), "é世");
    }

    #[test]
    fn test_supplementary_uses_surrogate_pairs() {
        let encoded = encode("😀");
        assert_eq!(encoded, [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&encoded).unwrap(), "😀");
    }

    #[test]
    fn test_rejects_invalid() {
        // Raw NUL and 4-byte UTF-8 forms are not modified UTF-8.
        assert_eq!(decode(&[0x41, 0x00]), Err(Mutf8Error { offset: 1 }));
        assert!(decode("😀".as_bytes()).is_err());
        // Truncated two-byte form.
        assert_eq!(decode(&[0xC3]), Err(Mutf8Error { offset: 1 }));
    }

    #[test]
    fn test_lone_surrogates() {
        // javac writes "\uD800" as ED A0 80; a String cannot hold it.
        assert_eq!(decode(&[0x41, 0xED, 0xA0, 0x80]), Err(Mutf8Error { offset: 1 }));
        assert_eq!(decode_lossy(&[0x41, 0xED, 0xA0, 0x80]), "A\u{FFFD}");
        // A low surrogate without a preceding high one.
        assert_eq!(decode_lossy(&[0xED, 0xB8, 0x80, 0x42]), "\u{FFFD}B");
        // High surrogate followed by a non-surrogate keeps the second unit.
        assert_eq!(decode_lossy(&[0xED, 0xA0, 0xBD, 0x43]), "\u{FFFD}C");
    }

    #[test]
    fn test_lossy_replaces_bad_bytes() {
        assert_eq!(decode_lossy(&[0x41, 0x00, 0x42]), "A\u{FFFD}B");
        assert_eq!(decode_lossy("😀".as_bytes()), "\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}");
        assert_eq!(decode_lossy(&encode("é😀")), "é😀");
    }
}
