//! Minimal class file builder for unit tests.

use super::{MAGIC, tag};

/// Builds a class named `name` extending `java/lang/Object`, with a
/// `SourceFile` attribute if `source_file` is set.
pub(crate) fn class_bytes(name: &str, source_file: Option<&str>) -> Vec<u8> {
    let mut pool = Vec::new();
    let utf8 = |pool: &mut Vec<u8>, s: &str| {
        pool.push(tag::UTF8);
        pool.extend_from_slice(&(s.len() as u16).to_be_bytes());
        pool.extend_from_slice(s.as_bytes());
    };
    utf8(&mut pool, name); // 1
    pool.extend_from_slice(&[tag::CLASS, 0, 1]); // 2
    utf8(&mut pool, "java/lang/Object"); // 3
    pool.extend_from_slice(&[tag::CLASS, 0, 3]); // 4
    utf8(&mut pool, "SourceFile"); // 5
    utf8(&mut pool, source_file.unwrap_or("")); // 6

    let mut b = MAGIC.to_be_bytes().to_vec();
    b.extend_from_slice(&[0, 0, 0, 52, 0, 7]);
    b.extend_from_slice(&pool);
    b.extend_from_slice(&[0x00, 0x21, 0, 2, 0, 4, 0, 0, 0, 0, 0, 0]);
    if source_file.is_some() {
        b.extend_from_slice(&[0, 1, 0, 5, 0, 0, 0, 2, 0, 6]);
    } else {
        b.extend_from_slice(&[0, 0]);
    }
    b
}
