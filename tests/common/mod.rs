//! Shared test utilities for integration tests.
//!
//! Class files are assembled byte by byte so the tests do not depend on a
//! JVM toolchain. Archives are built with the crate's own [`ZipWriter`].
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use sourcefile_fixer::classfile::{ClassFile, MAGIC, tag};
use sourcefile_fixer::codec::CompressionMethod;
use sourcefile_fixer::{EntryName, ZipArchive, ZipEntry, ZipWriter};

/// Builder for small but realistic class files.
///
/// The generated class has one `main`-like method with a `Code` attribute and
/// a `long` constant, so parsing has to handle wide pool slots and nested
/// attributes.
pub struct ClassBuilder {
    name: String,
    source_file: Option<String>,
    major_version: u16,
    extra_utf8: Vec<Vec<u8>>,
}

impl ClassBuilder {
    /// A class with the internal name `name`, e.g. `com/Foo$Bar`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_file: None,
            major_version: 52,
            extra_utf8: Vec::new(),
        }
    }

    /// Adds a `SourceFile` attribute.
    pub fn source_file(mut self, value: &str) -> Self {
        self.source_file = Some(value.to_string());
        self
    }

    /// Sets the class file major version.
    pub fn major_version(mut self, version: u16) -> Self {
        self.major_version = version;
        self
    }

    /// Adds a Utf8 constant with the given raw bytes, which need not be
    /// valid modified UTF-8.
    pub fn utf8_constant(mut self, bytes: &[u8]) -> Self {
        self.extra_utf8.push(bytes.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        let mut count = 1u16;
        let mut utf8 = |pool: &mut Vec<u8>, s: &[u8]| -> u16 {
            pool.push(tag::UTF8);
            pool.extend_from_slice(&(s.len() as u16).to_be_bytes());
            pool.extend_from_slice(s);
            count += 1;
            count - 1
        };

        let name = utf8(&mut pool, self.name.as_bytes());
        let super_name = utf8(&mut pool, b"java/lang/Object");
        let method_name = utf8(&mut pool, b"run");
        let descriptor = utf8(&mut pool, b"()J");
        let code = utf8(&mut pool, b"Code");
        let source_attr = utf8(&mut pool, b"SourceFile");
        let source_value = utf8(
            &mut pool,
            self.source_file.as_deref().unwrap_or("").as_bytes(),
        );
        for bytes in &self.extra_utf8 {
            utf8(&mut pool, bytes);
        }

        let this_class = count;
        pool.extend_from_slice(&[tag::CLASS]);
        pool.extend_from_slice(&name.to_be_bytes());
        let super_class = this_class + 1;
        pool.extend_from_slice(&[tag::CLASS]);
        pool.extend_from_slice(&super_name.to_be_bytes());
        let long_index = super_class + 1;
        pool.push(tag::LONG);
        pool.extend_from_slice(&0x0123_4567_89AB_CDEFu64.to_be_bytes());
        let pool_count = long_index + 2;

        let mut b = MAGIC.to_be_bytes().to_vec();
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(&self.major_version.to_be_bytes());
        b.extend_from_slice(&pool_count.to_be_bytes());
        b.extend_from_slice(&pool);

        b.extend_from_slice(&0x0021u16.to_be_bytes());
        b.extend_from_slice(&this_class.to_be_bytes());
        b.extend_from_slice(&super_class.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        b.extend_from_slice(&0u16.to_be_bytes()); // fields

        // one method: ldc2_w #long; lreturn
        let bytecode = [0x14, (long_index >> 8) as u8, long_index as u8, 0xAD];
        let mut code_attr = Vec::new();
        code_attr.extend_from_slice(&2u16.to_be_bytes()); // max_stack
        code_attr.extend_from_slice(&1u16.to_be_bytes()); // max_locals
        code_attr.extend_from_slice(&(bytecode.len() as u32).to_be_bytes());
        code_attr.extend_from_slice(&bytecode);
        code_attr.extend_from_slice(&0u16.to_be_bytes()); // exception table
        code_attr.extend_from_slice(&0u16.to_be_bytes()); // attributes

        b.extend_from_slice(&1u16.to_be_bytes());
        b.extend_from_slice(&0x0009u16.to_be_bytes());
        b.extend_from_slice(&method_name.to_be_bytes());
        b.extend_from_slice(&descriptor.to_be_bytes());
        b.extend_from_slice(&1u16.to_be_bytes());
        b.extend_from_slice(&code.to_be_bytes());
        b.extend_from_slice(&(code_attr.len() as u32).to_be_bytes());
        b.extend_from_slice(&code_attr);

        match self.source_file {
            Some(_) => {
                b.extend_from_slice(&1u16.to_be_bytes());
                b.extend_from_slice(&source_attr.to_be_bytes());
                b.extend_from_slice(&2u32.to_be_bytes());
                b.extend_from_slice(&source_value.to_be_bytes());
            }
            None => b.extend_from_slice(&0u16.to_be_bytes()),
        }
        b
    }
}

/// Shorthand for `ClassBuilder::new(name).source_file(source).build()`.
pub fn class(name: &str, source: &str) -> Vec<u8> {
    ClassBuilder::new(name).source_file(source).build()
}

/// Builds an in-memory zip archive with deflated entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    zip_bytes_with(entries, CompressionMethod::Deflated)
}

/// Builds an in-memory zip archive with every entry stored with `method`.
pub fn zip_bytes_with(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Vec::new());
    for (name, data) in entries {
        let header = ZipEntry::new(EntryName::new(name).unwrap(), method);
        writer.add(&header, data).unwrap();
    }
    writer.finish_into_inner().unwrap().1
}

/// Writes a zip archive to disk.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    fs::write(path, zip_bytes(entries)).unwrap();
}

/// Reads every entry of a zip archive, in central directory order.
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::open(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let names: Vec<String> = archive
        .entries()
        .iter()
        .map(|e| e.name.as_str().to_string())
        .collect();
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, archive.read(i).unwrap()))
        .collect()
}

/// Reads a zip archive from disk.
pub fn read_zip_file(path: &Path) -> Vec<(String, Vec<u8>)> {
    read_zip(&fs::read(path).unwrap())
}

/// Looks up one entry by name.
pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| data.as_slice())
        .unwrap_or_else(|| panic!("no entry named {name}"))
}

/// Entry names, in order.
pub fn names(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
    entries.iter().map(|(n, _)| n.as_str()).collect()
}

/// Parses a class file and returns its SourceFile value.
pub fn source_file_of(bytes: &[u8]) -> Option<String> {
    ClassFile::parse(bytes).unwrap().source_file()
}
