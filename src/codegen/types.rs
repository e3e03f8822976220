// Tue Jan 13 2026 - Alex

use crate::codegen::{CodeWriter, CodegenError};
use crate::layout::{Endian, ModeKind, PrimitiveType, TypeRef, TypeRegistry};
use crate::utils::StringUtils;
use std::collections::HashMap;

/// Byte position of a value inside `buf`: a literal offset or a runtime expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    Const(usize),
    Expr(String),
}

impl At {
    pub fn index(&self) -> String {
        match self {
            At::Const(n) => n.to_string(),
            At::Expr(e) => e.clone(),
        }
    }

    pub fn range(&self, size: usize) -> String {
        match self {
            At::Const(n) => format!("{}..{}", n, n + size),
            At::Expr(e) => format!("{}..{} + {}", e, e, size),
        }
    }

    fn offset(&self, delta: &str) -> String {
        match self {
            At::Const(0) => delta.to_string(),
            _ => format!("{} + {}", self.index(), delta),
        }
    }
}

/// An expression to encode from; `by_ref` when it evaluates to a reference.
#[derive(Debug, Clone)]
pub struct Place {
    expr: String,
    by_ref: bool,
}

impl Place {
    pub fn value(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            by_ref: false,
        }
    }

    pub fn borrowed(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            by_ref: true,
        }
    }

    fn deref(&self) -> String {
        if self.by_ref {
            format!("*{}", self.expr)
        } else {
            self.expr.clone()
        }
    }
}

/// Maps layout types to Rust and knows how sibling layouts are accessed.
pub struct TypeMapper<'a> {
    registry: &'a TypeRegistry,
    modes: &'a HashMap<String, ModeKind>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(registry: &'a TypeRegistry, modes: &'a HashMap<String, ModeKind>) -> Self {
        Self { registry, modes }
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Aliases keep their name; they are emitted as `pub type` items.
    pub fn rust_type(&self, ty: &TypeRef) -> Result<String, CodegenError> {
        Ok(match ty {
            TypeRef::Primitive(p) => p.rust_name().to_string(),
            TypeRef::Array(len, elem) => format!("[{}; {}]", self.rust_type(elem)?, len),
            TypeRef::Slice(elem) => format!("Vec<{}>", self.rust_type(elem)?),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Pointer(_) => {
                return Err(CodegenError::Unsupported {
                    ty: ty.to_string(),
                    reason: "pointers have no byte representation",
                })
            }
        })
    }

    /// Resolves aliases at every level of nesting.
    pub fn resolve(&self, ty: &TypeRef) -> Result<TypeRef, CodegenError> {
        self.registry
            .resolve_deep(ty)
            .map_err(|e| CodegenError::InvalidLayout(e.to_string()))
    }

    pub fn size_of(&self, ty: &TypeRef) -> Result<usize, CodegenError> {
        self.registry
            .size_of(ty)
            .ok()
            .and_then(|s| s.fixed())
            .ok_or_else(|| CodegenError::InvalidLayout(format!("type {} has no fixed size", ty)))
    }

    pub fn mode_of(&self, name: &str) -> ModeKind {
        self.modes.get(name).copied().unwrap_or(ModeKind::Copy)
    }

    /// Suffix reading `member` from a value of struct type `parent`.
    pub fn member_access(&self, parent: &str, member: &str) -> String {
        let ident = StringUtils::field_ident(member);
        match self.mode_of(parent) {
            ModeKind::Copy => format!(".{}", ident),
            ModeKind::ZeroCopy => format!(".{}()", ident),
        }
    }

    /// Statement storing `value` into `member` of `target`, a struct of type `parent`.
    pub fn member_assign(&self, parent: &str, target: &str, member: &str, value: &str) -> String {
        let ident = StringUtils::field_ident(member);
        match self.mode_of(parent) {
            ModeKind::Copy => format!("{}.{} = {};", target, ident, value),
            ModeKind::ZeroCopy => format!("{}.set_{}({});", target, raw_ident(&ident), value),
        }
    }

    /// Decoding fails only through nested struct decoders.
    pub fn decode_fallible(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Named(_) => true,
            TypeRef::Array(_, elem) => self.decode_fallible(elem),
            _ => false,
        }
    }

    /// Primitives and arrays of primitives can be passed by value.
    pub fn is_copy(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(_) => true,
            TypeRef::Array(_, elem) => self.is_copy(elem),
            _ => false,
        }
    }
}

/// Strips a raw-identifier prefix so the name can be used inside a longer one.
pub fn raw_ident(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

/// Emits statements that move one value between a Rust place and `buf`.
pub struct ValueCodec<'a> {
    types: &'a TypeMapper<'a>,
    endian: Endian,
    field: String,
}

impl<'a> ValueCodec<'a> {
    pub fn new(types: &'a TypeMapper<'a>, endian: Endian, field: &str) -> Self {
        Self {
            types,
            endian,
            field: field.to_string(),
        }
    }

    fn suffix(&self) -> &'static str {
        self.endian.bytes_suffix()
    }

    /// `ty` must already be resolved.
    pub fn encode_value(
        &self,
        ty: &TypeRef,
        place: &Place,
        at: &At,
        depth: usize,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        match ty {
            TypeRef::Primitive(p) => {
                w.line(self.encode_primitive(*p, place, at));
            }
            TypeRef::Array(len, elem) if elem.is_byte() => {
                w.line(format!("buf[{}].copy_from_slice(&{}[..]);", at.range(*len), place.expr));
            }
            TypeRef::Array(_, elem) => {
                let elem_size = self.types.size_of(elem)?;
                let (i, item, pos) = (format!("i{}", depth), format!("item{}", depth), format!("at{}", depth));
                w.open(format!("for ({}, {}) in {}.iter().enumerate() {{", i, item, place.expr));
                w.line(format!("let {} = {};", pos, at.offset(&format!("{} * {}", i, elem_size))));
                self.encode_value(elem, &Place::borrowed(&item), &At::Expr(pos), depth + 1, w)?;
                w.close("}");
            }
            TypeRef::Named(_) => {
                let size = self.types.size_of(ty)?;
                w.line(format!("{}.encode_into(&mut buf[{}])?;", place.expr, at.range(size)));
            }
            TypeRef::Slice(_) | TypeRef::Pointer(_) => {
                return Err(CodegenError::Unsupported {
                    ty: ty.to_string(),
                    reason: "not a fixed-size value",
                })
            }
        }
        Ok(())
    }

    fn encode_primitive(&self, p: PrimitiveType, place: &Place, at: &At) -> String {
        match p {
            PrimitiveType::U8 | PrimitiveType::Byte => format!("buf[{}] = {};", at.index(), place.deref()),
            PrimitiveType::I8 | PrimitiveType::Bool => format!("buf[{}] = {} as u8;", at.index(), place.deref()),
            _ => format!(
                "buf[{}].copy_from_slice(&{}.to_{}_bytes());",
                at.range(p.size()),
                place.expr,
                self.suffix()
            ),
        }
    }

    /// Single expression for values whose decoding cannot fail.
    pub fn decode_expr(&self, ty: &TypeRef, at: &At, depth: usize) -> Result<String, CodegenError> {
        Ok(match ty {
            TypeRef::Primitive(p) => self.decode_primitive(*p, at),
            TypeRef::Array(len, elem) if elem.is_byte() => format!("read_array::<{}>(buf, {})", len, at.index()),
            TypeRef::Array(_, elem) if !self.types.decode_fallible(elem) => {
                let elem_size = self.types.size_of(elem)?;
                let i = format!("i{}", depth);
                let pos = At::Expr(at.offset(&format!("{} * {}", i, elem_size)));
                format!("std::array::from_fn(|{}| {})", i, self.decode_expr(elem, &pos, depth + 1)?)
            }
            TypeRef::Named(name) => {
                let size = self.types.size_of(ty)?;
                format!("{}::decode(&buf[{}])?", name, at.range(size))
            }
            _ => {
                return Err(CodegenError::Unsupported {
                    ty: ty.to_string(),
                    reason: "not a fixed-size value",
                })
            }
        })
    }

    fn decode_primitive(&self, p: PrimitiveType, at: &At) -> String {
        match p {
            PrimitiveType::U8 | PrimitiveType::Byte => format!("buf[{}]", at.index()),
            PrimitiveType::I8 => format!("buf[{}] as i8", at.index()),
            PrimitiveType::Bool => format!("buf[{}] != 0", at.index()),
            _ => format!(
                "{}::from_{}_bytes(read_array(buf, {}))",
                p.rust_name(),
                self.suffix(),
                at.index()
            ),
        }
    }

    /// Emits `let var = ...;` decoding `ty` from `buf` at `at`.
    pub fn decode_into(
        &self,
        ty: &TypeRef,
        var: &str,
        at: &At,
        depth: usize,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        let TypeRef::Array(len, elem) = ty else {
            w.line(format!("let {} = {};", var, self.decode_expr(ty, at, depth)?));
            return Ok(());
        };
        if !self.types.decode_fallible(elem) {
            w.line(format!("let {} = {};", var, self.decode_expr(ty, at, depth)?));
            return Ok(());
        }

        let elem_size = self.types.size_of(elem)?;
        let (i, items, pos, value) = (
            format!("i{}", depth),
            format!("items{}", depth),
            format!("at{}", depth),
            format!("value{}", depth),
        );
        w.line(format!("let mut {} = Vec::with_capacity({});", items, len));
        w.open(format!("for {} in 0..{} {{", i, len));
        w.line(format!("let {} = {};", pos, at.offset(&format!("{} * {}", i, elem_size))));
        self.decode_into(elem, &value, &At::Expr(pos), depth + 1, w)?;
        w.line(format!("{}.push({});", items, value));
        w.close("}");
        w.line(format!(
            "let {}: {} = {}.try_into().map_err(|v: Vec<_>| CodecError::ArrayLength {{ field: \"{}\", expected: {}, actual: v.len() }})?;",
            var,
            self.types.rust_type(ty)?,
            items,
            self.field,
            len
        ));
        Ok(())
    }
}
