// Tue Jan 13 2026 - Alex

use super::error::LayoutError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Array(usize, Box<TypeRef>),
    Slice(Box<TypeRef>),
    Named(String),
    Pointer(Box<TypeRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    U8,
    I8,
    Byte,
    Bool,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl TypeRef {
    /// Parses type notation such as `uint32`, `[16]byte`, `[]LeafElement` or `*Node`.
    pub fn parse(notation: &str) -> Result<Self, LayoutError> {
        let text = notation.trim();
        let invalid = || LayoutError::InvalidTypeNotation(notation.to_string());

        if text.is_empty() {
            return Err(invalid());
        }

        if let Some(rest) = text.strip_prefix("[]") {
            return Ok(Self::Slice(Box::new(Self::parse(rest).map_err(|_| invalid())?)));
        }

        if let Some(rest) = text.strip_prefix('[') {
            let close = rest.find(']').ok_or_else(invalid)?;
            let len: usize = rest[..close].trim().parse().map_err(|_| invalid())?;
            let elem = Self::parse(&rest[close + 1..]).map_err(|_| invalid())?;
            return Ok(Self::Array(len, Box::new(elem)));
        }

        if let Some(rest) = text.strip_prefix('*') {
            return Ok(Self::Pointer(Box::new(Self::parse(rest).map_err(|_| invalid())?)));
        }

        if let Some(primitive) = PrimitiveType::from_name(text) {
            return Ok(Self::Primitive(primitive));
        }

        let mut chars = text.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self::Named(text.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn slice_of(elem: TypeRef) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn array_of(len: usize, elem: TypeRef) -> Self {
        Self::Array(len, Box::new(elem))
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, Self::Slice(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    pub fn is_byte(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_byte())
    }

    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            Self::Slice(elem) | Self::Array(_, elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p.name()),
            Self::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            Self::Slice(elem) => write!(f, "[]{}", elem),
            Self::Named(name) => write!(f, "{}", name),
            Self::Pointer(inner) => write!(f, "*{}", inner),
        }
    }
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "uint8" => Self::U8,
            "int8" => Self::I8,
            "byte" => Self::Byte,
            "bool" => Self::Bool,
            "uint16" => Self::U16,
            "int16" => Self::I16,
            "uint32" => Self::U32,
            "int32" => Self::I32,
            "float32" => Self::F32,
            "uint64" => Self::U64,
            "int64" => Self::I64,
            "float64" => Self::F64,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::Byte => "byte",
            Self::Bool => "bool",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::F32 => "float32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F64 => "float64",
        }
    }

    pub fn rust_name(self) -> &'static str {
        match self {
            Self::U8 | Self::Byte => "u8",
            Self::I8 => "i8",
            Self::Bool => "bool",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F64 => "f64",
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Byte | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// `byte` and `uint8` name the same raw octet.
    pub fn is_byte(self) -> bool {
        matches!(self, Self::Byte | Self::U8)
    }

    /// Only the sized integer spellings qualify as count fields; `byte` does not.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::I8 | Self::U16 | Self::I16 | Self::U32 | Self::I32 | Self::U64 | Self::I64
        )
    }

    /// Largest element count a count field of this type may hold; `None` means unlimited.
    pub fn count_limit(self) -> Option<u64> {
        match self {
            Self::U8 | Self::I8 => Some(255),
            Self::U16 | Self::I16 => Some(65_535),
            Self::U32 | Self::I32 => Some(2_147_483_647),
            _ => None,
        }
    }
}
