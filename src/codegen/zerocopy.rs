// Tue Jan 13 2026 - Alex

use crate::analysis::{IndirectRef, Region};
use crate::codegen::context::{LayoutContext, Receiver};
use crate::codegen::copy::{emit_base, emit_capacity_check};
use crate::codegen::template::TemplateEngine;
use crate::codegen::types::{At, Place};
use crate::codegen::{CodeWriter, CodegenError};
use crate::layout::Field;

/// Emits a buffer-backed view whose accessors read and write in place.
pub struct ZeroCopyEmitter<'a> {
    ctx: &'a LayoutContext<'a>,
}

impl<'a> ZeroCopyEmitter<'a> {
    pub fn new(ctx: &'a LayoutContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn emit(&self, engine: &mut TemplateEngine, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let annotation = self.ctx.layout.annotation();
        let size = self.ctx.size();
        let align = annotation.align().map(|a| a.as_usize()).unwrap_or(1);
        let required = if align > 1 {
            format!("{} + {}", size, align - 1)
        } else {
            size.to_string()
        };

        engine.clear_variables();
        engine.set_variable("name", self.ctx.name());
        engine.set_variable("size", size);
        engine.set_variable("endian", annotation.endian);
        engine.set_variable("align", align);
        engine.set_variable("required", required);
        engine.set_variable("aligned", align > 1);
        engine.set_variable("allocator", annotation.allocator().unwrap_or(""));
        w.raw(&engine.render("zerocopy_core")?);
        w.blank();

        w.open(format!("impl {} {{", self.ctx.name()));
        let mut first = true;
        for (index, field, region) in self.ctx.fields() {
            if !first {
                w.blank();
            }
            first = false;
            match region {
                Some(region) if region.is_fixed() => self.emit_fixed(field, region, w)?,
                Some(region) => self.emit_dynamic(region, w)?,
                None => {
                    let entry = self
                        .ctx
                        .indirect()
                        .iter()
                        .find(|i| i.field == index)
                        .ok_or_else(|| CodegenError::InvalidLayout(format!("{} is unresolved", field.name())))?;
                    self.emit_indirect(field, entry, w)?;
                }
            }
        }
        w.close("}");
        Ok(())
    }

    fn emit_fixed(&self, field: &Field, region: &Region, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let ty = self.ctx.fixed_type(field)?;
        let rust = self.ctx.types.rust_type(field.ty())?;
        let ident = LayoutContext::ident(field);
        let stem = LayoutContext::stem(field);
        let at = At::Const(self.ctx.start(region)?);
        let codec = self.ctx.codec(field.name());
        let fallible = self.ctx.types.decode_fallible(&ty);

        if fallible {
            w.open(format!("pub fn {}(&self) -> Result<{}, CodecError> {{", ident, rust));
            w.line("let buf = self.as_bytes();");
            codec.decode_into(&ty, "value", &at, 0, w)?;
            w.line("Ok(value)");
        } else {
            w.open(format!("pub fn {}(&self) -> {} {{", ident, rust));
            w.line("let buf = self.as_bytes();");
            w.line(codec.decode_expr(&ty, &at, 0)?);
        }
        w.close("}");
        w.blank();

        let param = if self.ctx.types.is_copy(&ty) {
            rust
        } else {
            format!("&{}", rust)
        };
        if fallible {
            w.open(format!(
                "pub fn set_{}(&mut self, value: {}) -> Result<(), CodecError> {{",
                stem, param
            ));
        } else {
            w.open(format!("pub fn set_{}(&mut self, value: {}) {{", stem, param));
        }
        w.line("let buf = self.as_bytes_mut();");
        codec.encode_value(&ty, &Place::value("value"), &at, 0, w)?;
        if fallible {
            w.line("Ok(())");
        }
        w.close("}");
        Ok(())
    }

    fn emit_dynamic(&self, region: &Region, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let field = region.field();
        let ident = LayoutContext::ident(field);
        let stem = LayoutContext::stem(field);
        let (low, high) = self.ctx.span(region)?;
        let elem = self.ctx.element(region)?;
        let elem_size = region.element_size();
        let count = self.ctx.count_expr(region, Receiver::View)?;

        if elem.is_byte() && count.is_none() {
            w.open(format!("pub fn {}(&self) -> &[u8] {{", ident));
            w.line(format!("&self.as_bytes()[{}..{}]", low, high));
            w.close("}");
            w.blank();
            w.open(format!("pub fn {}_mut(&mut self) -> &mut [u8] {{", stem));
            w.line(format!("&mut self.as_bytes_mut()[{}..{}]", low, high));
            w.close("}");
            return Ok(());
        }

        let count = count.ok_or_else(|| CodegenError::InvalidLayout(format!("{} has no count", region.name())))?;

        w.line(format!("/// Elements in `{}`, checked against the space it may use.", region.name()));
        w.open(format!("pub fn {}_len(&self) -> Result<usize, CodecError> {{", stem));
        w.line(format!("let count = {};", count));
        emit_capacity_check(region.name(), "count", elem_size, high - low, w);
        w.line("Ok(count)");
        w.close("}");
        w.blank();

        if elem.is_byte() {
            for (name, receiver, view, out) in [
                (ident.clone(), "&self", "self.as_bytes()", "&[u8]"),
                (format!("{}_mut", stem), "&mut self", "self.as_bytes_mut()", "&mut [u8]"),
            ] {
                let borrow = if out.starts_with("&mut") { "&mut " } else { "&" };
                w.open(format!("pub fn {}({}) -> Result<{}, CodecError> {{", name, receiver, out));
                w.line(format!("let count = self.{}_len()?;", stem));
                emit_base(region, "base", "count", elem_size, w)?;
                w.line(format!("Ok({}{}[base..base + count])", borrow, view));
                w.close("}");
                if !out.starts_with("&mut") {
                    w.blank();
                }
            }
            return Ok(());
        }

        let rust = self.ctx.types.rust_type(&elem)?;
        let codec = self.ctx.codec(region.name());

        w.open(format!("pub fn {}_at(&self, index: usize) -> Result<{}, CodecError> {{", stem, rust));
        self.emit_index_prologue(region, &stem, w)?;
        w.line("let buf = self.as_bytes();");
        codec.decode_into(&elem, "value", &At::Expr("at0".to_string()), 1, w)?;
        w.line("Ok(value)");
        w.close("}");
        w.blank();

        let param = if self.ctx.types.is_copy(&elem) {
            rust
        } else {
            format!("&{}", rust)
        };
        w.open(format!(
            "pub fn set_{}_at(&mut self, index: usize, value: {}) -> Result<(), CodecError> {{",
            stem, param
        ));
        self.emit_index_prologue(region, &stem, w)?;
        w.line("let buf = self.as_bytes_mut();");
        codec.encode_value(&elem, &Place::value("value"), &At::Expr("at0".to_string()), 1, w)?;
        w.line("Ok(())");
        w.close("}");
        Ok(())
    }

    fn emit_index_prologue(&self, region: &Region, stem: &str, w: &mut CodeWriter) -> Result<(), CodegenError> {
        w.line(format!("let count = self.{}_len()?;", stem));
        w.open("if index >= count {");
        w.line(format!(
            "return Err(CodecError::IndexOutOfRange {{ field: \"{}\", index, len: count }});",
            region.name()
        ));
        w.close("}");
        emit_base(region, "base", "count", region.element_size(), w)?;
        w.line(format!("let at0 = base + index * {};", region.element_size()));
        Ok(())
    }

    fn emit_indirect(&self, field: &Field, entry: &IndirectRef, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let stem = LayoutContext::stem(field);
        let from_stem = LayoutContext::stem(self.ctx.field_at(entry.from)?);
        let data = self.ctx.region_at(entry.region)?;
        let (low, high) = self.ctx.span(data)?;
        let meta = self.ctx.metadata_struct(entry)?;

        w.open(format!("pub fn {}_len(&self) -> Result<usize, CodecError> {{", stem));
        w.line(format!("self.{}_len()", from_stem));
        w.close("}");
        w.blank();

        w.line(format!(
            "/// Payload `index` of `{}`, located through `{}`.",
            field.name(),
            data.name()
        ));
        w.open(format!("pub fn {}_at(&self, index: usize) -> Result<&[u8], CodecError> {{", stem));
        w.line(format!("let item = self.{}_at(index)?;", from_stem));
        w.line(format!(
            "let offset = item{} as usize;",
            self.ctx.types.member_access(&meta, &entry.offset_member)
        ));
        w.line(format!(
            "let size = item{} as usize;",
            self.ctx.types.member_access(&meta, &entry.size_member)
        ));
        let guard = if low > 0 {
            format!(" if offset >= {} && end <= {}", low, high)
        } else {
            format!(" if end <= {}", high)
        };
        w.open("match offset.checked_add(size) {");
        w.line(format!("Some(end){} => Ok(&self.as_bytes()[offset..end]),", guard));
        w.line(format!(
            "_ => Err(CodecError::IndirectOutOfRange {{ field: \"{}\", index, offset, size }}),",
            field.name()
        ));
        w.close("}");
        w.close("}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::codegen::types::TypeMapper;
    use crate::layout::{ModeKind, TypeAnnotation, TypeLayout, TypeLayoutBuilder, TypeRegistry};
    use std::collections::HashMap;

    fn render(layout: &TypeLayout, registry: &TypeRegistry) -> String {
        let analyzed = analyze(layout, registry);
        assert!(analyzed.is_valid(), "{:?}", analyzed.errors());
        let mut modes = HashMap::new();
        modes.insert(layout.name().to_string(), ModeKind::ZeroCopy);
        let types = TypeMapper::new(registry, &modes);
        let ctx = LayoutContext::new(layout, &analyzed, &types);
        let mut engine = TemplateEngine::new();
        engine.load_built_in_templates();
        let mut w = CodeWriter::new();
        ZeroCopyEmitter::new(&ctx).emit(&mut engine, &mut w).unwrap();
        w.finish()
    }

    fn page(annotation: &str) -> TypeLayout {
        TypeLayoutBuilder::new("Page")
            .annotation(TypeAnnotation::parse(annotation).unwrap())
            .field("Header", "uint16", "@0")
            .field("Body", "[]byte", "start-end")
            .field("Footer", "uint64", "@4088")
            .build()
            .unwrap()
    }

    #[test]
    fn test_aligned_allocation() {
        let out = render(&page("@layout size=4096 mode=zerocopy align=512"), &TypeRegistry::new());
        assert!(out.contains("pub const ALIGN: usize = 512;"));
        assert!(out.contains("pub const REQUIRED: usize = 4096 + 511;"));
        assert!(out.contains("let backing = vec![0u8; Self::REQUIRED];"));
        assert!(out.contains("align_offset(Self::ALIGN)"));
        assert!(!out.contains("panic!"));
    }

    #[test]
    fn test_allocator_length_is_checked() {
        let out = render(
            &page("@layout size=4096 mode=zerocopy align=512 allocator=page_alloc"),
            &TypeRegistry::new(),
        );
        assert!(out.contains("let backing: Vec<u8> = page_alloc(Self::REQUIRED);"));
        assert!(out.contains("if backing.len() < Self::REQUIRED {"));
        assert!(out.contains("panic!("));
    }

    #[test]
    fn test_unaligned_view() {
        let out = render(&page("@layout size=4096 mode=zerocopy"), &TypeRegistry::new());
        assert!(out.contains("pub const REQUIRED: usize = 4096;"));
        assert!(out.contains("let start = 0;"));
        assert!(!out.contains("align_offset"));
    }

    #[test]
    fn test_fixed_and_byte_accessors() {
        let out = render(&page("@layout size=4096 mode=zerocopy endian=big"), &TypeRegistry::new());
        assert!(out.contains("pub fn header(&self) -> u16 {"));
        assert!(out.contains("u16::from_be_bytes(read_array(buf, 0))"));
        assert!(out.contains("pub fn set_footer(&mut self, value: u64) {"));
        assert!(out.contains("buf[4088..4096].copy_from_slice(&value.to_be_bytes());"));
        assert!(out.contains("pub fn body(&self) -> &[u8] {"));
        assert!(out.contains("&self.as_bytes()[2..4088]"));
        assert!(out.contains("pub fn body_mut(&mut self) -> &mut [u8] {"));
    }

    #[test]
    fn test_counted_element_accessors() {
        let layout = TypeLayoutBuilder::new("Slotted")
            .annotation(TypeAnnotation::parse("@layout size=256 mode=zerocopy").unwrap())
            .field("Count", "uint16", "@0")
            .field("Slots", "[]uint32", "@256,end-start,count=Count")
            .build()
            .unwrap();
        let out = render(&layout, &TypeRegistry::new());
        assert!(out.contains("pub fn slots_len(&self) -> Result<usize, CodecError> {"));
        assert!(out.contains("let count = self.count() as usize;"));
        assert!(out.contains("if count > 63 {"));
        assert!(out.contains("let base = 256 - count * 4;"));
        assert!(out.contains("pub fn slots_at(&self, index: usize) -> Result<u32, CodecError> {"));
        assert!(out.contains("let value = u32::from_le_bytes(read_array(buf, at0));"));
        assert!(out.contains("pub fn set_slots_at(&mut self, index: usize, value: u32) -> Result<(), CodecError> {"));
    }

    #[test]
    fn test_indirect_view() {
        let mut registry = TypeRegistry::new();
        let slot = TypeLayoutBuilder::new("Slot")
            .field("Offset", "uint16", "@0")
            .field("Size", "uint16", "@2")
            .build()
            .unwrap();
        registry.register("Slot", 4);
        registry.register_members("Slot", slot.members());

        let layout = TypeLayoutBuilder::new("Record")
            .annotation(TypeAnnotation::parse("@layout size=512 mode=zerocopy").unwrap())
            .field("Count", "uint16", "@0")
            .field("Slots", "[]Slot", "start-end,count=Count")
            .field("Heap", "[]byte", "end-start")
            .field("Values", "[][]byte", "from=Slots,offset=Offset,size=Size,region=Heap")
            .build()
            .unwrap();
        let out = render(&layout, &registry);
        assert!(out.contains("pub fn slots_at(&self, index: usize) -> Result<Slot, CodecError> {"));
        assert!(out.contains("pub fn set_slots_at(&mut self, index: usize, value: &Slot) -> Result<(), CodecError> {"));
        assert!(out.contains("pub fn heap(&self) -> &[u8] {"));
        assert!(out.contains("pub fn values_at(&self, index: usize) -> Result<&[u8], CodecError> {"));
        assert!(out.contains("let item = self.slots_at(index)?;"));
        assert!(out.contains("let offset = item.offset as usize;"));
        assert!(out.contains("Some(end) if offset >= 2 && end <= 512 => Ok(&self.as_bytes()[offset..end]),"));
    }
}
