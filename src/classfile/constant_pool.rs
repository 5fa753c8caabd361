//! The constant pool of a class file.

use super::mutf8;
use super::parser::{ClassFormatError, ParseResult, Parser};

/// Constant pool tags.
pub mod tag {
    #![allow(missing_docs)]
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// One constant pool entry.
///
/// Numeric constants are kept as their raw bits and Utf8 constants as their
/// raw modified UTF-8 bytes, so serialization reproduces the input exactly.
/// Utf8 bytes are not validated: only the constants that are actually read
/// get decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl Constant {
    /// The tag byte of this constant.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Utf8(_) => tag::UTF8,
            Self::Integer(_) => tag::INTEGER,
            Self::Float(_) => tag::FLOAT,
            Self::Long(_) => tag::LONG,
            Self::Double(_) => tag::DOUBLE,
            Self::Class { .. } => tag::CLASS,
            Self::String { .. } => tag::STRING,
            Self::Fieldref { .. } => tag::FIELDREF,
            Self::Methodref { .. } => tag::METHODREF,
            Self::InterfaceMethodref { .. } => tag::INTERFACE_METHODREF,
            Self::NameAndType { .. } => tag::NAME_AND_TYPE,
            Self::MethodHandle { .. } => tag::METHOD_HANDLE,
            Self::MethodType { .. } => tag::METHOD_TYPE,
            Self::Dynamic { .. } => tag::DYNAMIC,
            Self::InvokeDynamic { .. } => tag::INVOKE_DYNAMIC,
            Self::Module { .. } => tag::MODULE,
            Self::Package { .. } => tag::PACKAGE,
        }
    }

    /// Long and Double constants take two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Self::Long(_) | Self::Double(_))
    }

    fn parse(parser: &mut Parser<'_>) -> ParseResult<Self> {
        let at = parser.pos();
        let tag = parser.read_u8("constant tag")?;
        let constant = match tag {
            tag::UTF8 => {
                let len = parser.read_u16("utf8 length")?;
                Self::Utf8(parser.read_bytes(usize::from(len), "utf8 constant")?.to_vec())
            }
            tag::INTEGER => Self::Integer(parser.read_u32("constant")?),
            tag::FLOAT => Self::Float(parser.read_u32("constant")?),
            tag::LONG => Self::Long(parser.read_u64("constant")?),
            tag::DOUBLE => Self::Double(parser.read_u64("constant")?),
            tag::CLASS => Self::Class {
                name_index: u2(parser)?,
            },
            tag::STRING => Self::String {
                string_index: u2(parser)?,
            },
            tag::FIELDREF => Self::Fieldref {
                class_index: u2(parser)?,
                name_and_type_index: u2(parser)?,
            },
            tag::METHODREF => Self::Methodref {
                class_index: u2(parser)?,
                name_and_type_index: u2(parser)?,
            },
            tag::INTERFACE_METHODREF => Self::InterfaceMethodref {
                class_index: u2(parser)?,
                name_and_type_index: u2(parser)?,
            },
            tag::NAME_AND_TYPE => Self::NameAndType {
                name_index: u2(parser)?,
                descriptor_index: u2(parser)?,
            },
            tag::METHOD_HANDLE => Self::MethodHandle {
                reference_kind: parser.read_u8("constant")?,
                reference_index: u2(parser)?,
            },
            tag::METHOD_TYPE => Self::MethodType {
                descriptor_index: u2(parser)?,
            },
            tag::DYNAMIC => Self::Dynamic {
                bootstrap_method_attr_index: u2(parser)?,
                name_and_type_index: u2(parser)?,
            },
            tag::INVOKE_DYNAMIC => Self::InvokeDynamic {
                bootstrap_method_attr_index: u2(parser)?,
                name_and_type_index: u2(parser)?,
            },
            tag::MODULE => Self::Module {
                name_index: u2(parser)?,
            },
            tag::PACKAGE => Self::Package {
                name_index: u2(parser)?,
            },
            other => {
                return Err(ClassFormatError::new(
                    at,
                    format!("unknown constant pool tag {}", other),
                ));
            }
        };
        Ok(constant)
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.tag());
        match self {
            Self::Utf8(bytes) => {
                put_u2(out, bytes.len() as u16);
                out.extend_from_slice(bytes);
            }
            Self::Integer(bits) | Self::Float(bits) => out.extend_from_slice(&bits.to_be_bytes()),
            Self::Long(bits) | Self::Double(bits) => out.extend_from_slice(&bits.to_be_bytes()),
            Self::Class { name_index: a }
            | Self::String { string_index: a }
            | Self::MethodType { descriptor_index: a }
            | Self::Module { name_index: a }
            | Self::Package { name_index: a } => put_u2(out, *a),
            Self::Fieldref {
                class_index: a,
                name_and_type_index: b,
            }
            | Self::Methodref {
                class_index: a,
                name_and_type_index: b,
            }
            | Self::InterfaceMethodref {
                class_index: a,
                name_and_type_index: b,
            }
            | Self::NameAndType {
                name_index: a,
                descriptor_index: b,
            }
            | Self::Dynamic {
                bootstrap_method_attr_index: a,
                name_and_type_index: b,
            }
            | Self::InvokeDynamic {
                bootstrap_method_attr_index: a,
                name_and_type_index: b,
            } => {
                put_u2(out, *a);
                put_u2(out, *b);
            }
            Self::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                out.push(*reference_kind);
                put_u2(out, *reference_index);
            }
        }
    }
}

fn u2(parser: &mut Parser<'_>) -> ParseResult<u16> {
    parser.read_u16("constant")
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// The constant pool, indexed from 1.
///
/// Slot 0 and the slot following each Long or Double are unusable and hold
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
}

impl ConstantPool {
    pub(crate) fn parse(parser: &mut Parser<'_>) -> ParseResult<Self> {
        let count = parser.read_u16("constant pool count")?;
        if count == 0 {
            return Err(parser.error("constant pool count is 0"));
        }
        let mut slots = Vec::with_capacity(usize::from(count));
        slots.push(None);
        while slots.len() < usize::from(count) {
            let at = parser.pos();
            let constant = Constant::parse(parser)?;
            let wide = constant.is_wide();
            slots.push(Some(constant));
            if wide {
                if slots.len() >= usize::from(count) {
                    return Err(ClassFormatError::new(
                        at,
                        "wide constant occupies the last pool slot",
                    ));
                }
                slots.push(None);
            }
        }
        Ok(Self { slots })
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.slots.len() as u16).to_be_bytes());
        for constant in self.slots.iter().flatten() {
            constant.write_to(out);
        }
    }

    /// The `constant_pool_count` value: number of slots including slot 0.
    pub fn count(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Returns the constant at `index`, or `None` for unusable or
    /// out-of-range slots.
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.slots.get(usize::from(index)).and_then(Option::as_ref)
    }

    /// Iterates over `(index, constant)` pairs of usable slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as u16, c)))
    }

    /// Decodes the Utf8 constant at `index`.
    ///
    /// `None` if there is no Utf8 constant at `index` or if it does not
    /// decode to a string, e.g. because it holds a lone surrogate.
    pub fn utf8(&self, index: u16) -> Option<String> {
        match self.get(index)? {
            Constant::Utf8(bytes) => mutf8::decode(bytes).ok(),
            _ => None,
        }
    }

    /// Decodes the Utf8 constant at `index`, replacing undecodable parts
    /// with U+FFFD.
    pub fn utf8_lossy(&self, index: u16) -> Option<String> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Some(mutf8::decode_lossy(bytes)),
            _ => None,
        }
    }

    /// Returns `true` if the constant at `index` is a Utf8 constant equal to
    /// `value`.
    pub(crate) fn utf8_eq(&self, index: u16, value: &str) -> bool {
        matches!(self.get(index), Some(Constant::Utf8(bytes)) if *bytes == mutf8::encode(value))
    }

    /// Resolves the name of the Class constant at `index`, decoded lossily.
    pub fn class_name(&self, index: u16) -> Option<String> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8_lossy(*name_index),
            _ => None,
        }
    }

    /// Overwrites the Utf8 constant at `index` in place.
    ///
    /// Every other reference to the same constant sees the new value.
    pub(crate) fn set_utf8(&mut self, index: u16, value: &str) -> Result<(), String> {
        let encoded = mutf8::encode(value);
        if encoded.len() > usize::from(u16::MAX) {
            return Err(format!(
                "value of {} bytes does not fit a Utf8 constant",
                encoded.len()
            ));
        }
        match self.slots.get_mut(usize::from(index)) {
            Some(Some(Constant::Utf8(bytes))) => {
                *bytes = encoded;
                Ok(())
            }
            _ => Err(format!("constant #{} is not a Utf8 constant", index)),
        }
    }
}
