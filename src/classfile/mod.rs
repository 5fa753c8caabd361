//! JVM class file model.
//!
//! [`ClassFile::parse`] reads a class file into a lossless structure: the
//! constant pool is typed, while fields, methods and attributes keep their
//! attribute payloads as raw bytes. [`ClassFile::to_bytes`] writes it back,
//! so a class that was not modified serializes to its exact input bytes.
//!
//! Only the class-level `SourceFile` attribute is interpreted, through
//! [`source_file`](ClassFile::source_file) and
//! [`set_source_file`](ClassFile::set_source_file).
//!
//! # Example
//!
//! ```rust,no_run
//! use sourcefile_fixer::classfile::ClassFile;
//!
//! let bytes = std::fs::read("Foo.class")?;
//! let mut class = ClassFile::parse(&bytes)?;
//! println!("{} from {:?}", class.name(), class.source_file());
//! class.set_source_file("Foo.java")?;
//! std::fs::write("Foo.class", class.to_bytes())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod constant_pool;
pub mod mutf8;
mod parser;
#[cfg(test)]
pub(crate) mod testing;

pub use constant_pool::{Constant, ConstantPool, tag};
pub use parser::ClassFormatError;

use parser::{ParseResult, Parser};

/// Class file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Name of the attribute recording the source file.
pub const SOURCE_FILE_ATTRIBUTE: &str = "SourceFile";

/// An attribute, kept as its name index and raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Constant pool index of the attribute name.
    pub name_index: u16,
    /// The attribute payload.
    pub info: Vec<u8>,
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags.
    pub access_flags: u16,
    /// Constant pool index of the member name.
    pub name_index: u16,
    /// Constant pool index of the member descriptor.
    pub descriptor_index: u16,
    /// Member attributes.
    pub attributes: Vec<AttributeInfo>,
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    minor_version: u16,
    major_version: u16,
    constant_pool: ConstantPool,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<MemberInfo>,
    methods: Vec<MemberInfo>,
    attributes: Vec<AttributeInfo>,
    name: String,
}

impl ClassFile {
    /// Parses a class file.
    ///
    /// Beyond the structure itself, only the class name is resolved: no
    /// bytecode or descriptor verification takes place.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFormatError`] for a wrong magic number, truncated or
    /// trailing data, unknown constant tags, an unresolvable `this_class`, or
    /// a malformed `SourceFile` attribute. Utf8 constants are not validated.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFormatError> {
        let mut parser = Parser::new(bytes);
        let magic = parser.read_u32("magic")?;
        if magic != MAGIC {
            return Err(ClassFormatError::new(0, format!("bad magic {:#010x}", magic)));
        }
        let minor_version = parser.read_u16("minor version")?;
        let major_version = parser.read_u16("major version")?;
        let constant_pool = ConstantPool::parse(&mut parser)?;

        let access_flags = parser.read_u16("access flags")?;
        let this_class_at = parser.pos();
        let this_class = parser.read_u16("this_class")?;
        let super_class = parser.read_u16("super_class")?;
        let name = constant_pool.class_name(this_class).ok_or_else(|| {
            ClassFormatError::new(
                this_class_at,
                format!("this_class #{} is not a Class constant", this_class),
            )
        })?;

        let interface_count = parser.read_u16("interface count")?;
        let interfaces = (0..interface_count)
            .map(|_| parser.read_u16("interface"))
            .collect::<ParseResult<Vec<_>>>()?;
        let fields = parse_members(&mut parser, "field")?;
        let methods = parse_members(&mut parser, "method")?;
        let attributes_at = parser.pos();
        let attributes = parse_attributes(&mut parser)?;

        if parser.remaining() != 0 {
            return Err(parser.error(format!(
                "{} trailing bytes after class attributes",
                parser.remaining()
            )));
        }

        let class = Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            name,
        };
        if let Some(attribute) = class.source_file_attribute() {
            if attribute.info.len() != 2 {
                return Err(ClassFormatError::new(
                    attributes_at,
                    format!(
                        "SourceFile attribute has length {}, expected 2",
                        attribute.info.len()
                    ),
                ));
            }
        }
        Ok(class)
    }

    /// Serializes the class file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write_to(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        out
    }

    /// Internal name of the class, e.g. `com/example/Foo$Bar`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minor and major version.
    pub fn version(&self) -> (u16, u16) {
        (self.minor_version, self.major_version)
    }

    /// The constant pool.
    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    /// Class access flags.
    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    /// Internal name of the superclass, `None` for `java/lang/Object` and
    /// module descriptors.
    pub fn super_class_name(&self) -> Option<String> {
        self.constant_pool.class_name(self.super_class)
    }

    /// Constant pool indices of the implemented interfaces.
    pub fn interfaces(&self) -> &[u16] {
        &self.interfaces
    }

    /// Declared fields.
    pub fn fields(&self) -> &[MemberInfo] {
        &self.fields
    }

    /// Declared methods.
    pub fn methods(&self) -> &[MemberInfo] {
        &self.methods
    }

    /// Class-level attributes.
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    fn source_file_attribute(&self) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| self.constant_pool.utf8_eq(a.name_index, SOURCE_FILE_ATTRIBUTE))
    }

    /// Constant pool index the `SourceFile` attribute points at.
    pub fn source_file_index(&self) -> Option<u16> {
        self.source_file_attribute()
            .map(|a| u16::from_be_bytes([a.info[0], a.info[1]]))
    }

    /// Value of the `SourceFile` attribute.
    ///
    /// `None` if the class has no such attribute, if it does not point at a
    /// Utf8 constant, or if that constant holds a lone surrogate or other
    /// bytes a `String` cannot represent.
    pub fn source_file(&self) -> Option<String> {
        self.constant_pool.utf8(self.source_file_index()?)
    }

    /// Overwrites the `SourceFile` value in place.
    ///
    /// The Utf8 constant the attribute points at is replaced, so any other
    /// reference to that constant changes too.
    ///
    /// # Errors
    ///
    /// Fails if the class has no `SourceFile` attribute, if the attribute
    /// does not point at a Utf8 constant, or if `value` is too long.
    pub fn set_source_file(&mut self, value: &str) -> Result<(), ClassFormatError> {
        let index = self.source_file_index().ok_or_else(|| {
            ClassFormatError::new(0, format!("{} has no SourceFile attribute", self.name))
        })?;
        self.constant_pool
            .set_utf8(index, value)
            .map_err(|reason| ClassFormatError::new(0, reason))
    }
}

fn parse_attributes(parser: &mut Parser<'_>) -> ParseResult<Vec<AttributeInfo>> {
    let count = parser.read_u16("attribute count")?;
    let mut attributes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name_index = parser.read_u16("attribute name")?;
        let len = parser.read_u32("attribute length")?;
        let info = parser.read_bytes(len as usize, "attribute")?.to_vec();
        attributes.push(AttributeInfo { name_index, info });
    }
    Ok(attributes)
}

fn parse_members(parser: &mut Parser<'_>, what: &str) -> ParseResult<Vec<MemberInfo>> {
    let count = parser.read_u16(what)?;
    let mut members = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        members.push(MemberInfo {
            access_flags: parser.read_u16(what)?,
            name_index: parser.read_u16(what)?,
            descriptor_index: parser.read_u16(what)?,
            attributes: parse_attributes(parser)?,
        });
    }
    Ok(members)
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[AttributeInfo]) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attribute in attributes {
        out.extend_from_slice(&attribute.name_index.to_be_bytes());
        out.extend_from_slice(&(attribute.info.len() as u32).to_be_bytes());
        out.extend_from_slice(&attribute.info);
    }
}

fn write_members(out: &mut Vec<u8>, members: &[MemberInfo]) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        write_attributes(out, &member.attributes);
    }
}
