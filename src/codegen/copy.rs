// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::codegen::context::{LayoutContext, Receiver};
use crate::codegen::types::{At, Place};
use crate::codegen::{CodeWriter, CodegenError};
use std::collections::HashSet;

/// Emits an owned struct plus `encode`/`decode` that copy every field.
pub struct CopyEmitter<'a> {
    ctx: &'a LayoutContext<'a>,
    derives: &'a [String],
    emit_struct: bool,
}

impl<'a> CopyEmitter<'a> {
    pub fn new(ctx: &'a LayoutContext<'a>, derives: &'a [String]) -> Self {
        Self {
            ctx,
            derives,
            emit_struct: true,
        }
    }

    pub fn with_struct_definition(mut self, emit: bool) -> Self {
        self.emit_struct = emit;
        self
    }

    pub fn emit(&self, w: &mut CodeWriter) -> Result<(), CodegenError> {
        self.check_supported()?;

        if self.emit_struct {
            self.emit_struct_definition(w)?;
            w.blank();
        }

        w.open(format!("impl {} {{", self.ctx.name()));
        w.line(format!("pub const SIZE: usize = {};", self.ctx.size()));
        w.blank();
        w.open("pub fn encode(&self) -> Result<Vec<u8>, CodecError> {");
        w.line("let mut buf = vec![0u8; Self::SIZE];");
        w.line("self.encode_into(&mut buf)?;");
        w.line("Ok(buf)");
        w.close("}");
        w.blank();
        self.emit_encode_into(w)?;
        w.blank();
        self.emit_decode(w)?;
        w.close("}");
        Ok(())
    }

    fn check_supported(&self) -> Result<(), CodegenError> {
        for indirect in self.ctx.indirect() {
            let data = self.ctx.region_at(indirect.region)?;
            if data.count_field().is_some() {
                return Err(CodegenError::Unsupported {
                    ty: data.field().ty().to_string(),
                    reason: "an indirect data region cannot carry its own count",
                });
            }
        }
        Ok(())
    }

    fn emit_struct_definition(&self, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let annotation = self.ctx.layout.annotation();
        w.line(format!(
            "/// `{}` laid out over {} bytes ({}-endian).",
            self.ctx.name(),
            self.ctx.size(),
            annotation.endian
        ));

        let mut derives: Vec<&str> = self.derives.iter().map(String::as_str).collect();
        if !self.ctx.indirect().is_empty() && !derives.contains(&"Clone") {
            derives.push("Clone");
        }
        if !derives.is_empty() {
            w.line(format!("#[derive({})]", derives.join(", ")));
        }

        w.open(format!("pub struct {} {{", self.ctx.name()));
        for (index, field, _) in self.ctx.fields() {
            if self.ctx.is_data_region(index) {
                continue;
            }
            w.line(format!(
                "pub {}: {},",
                LayoutContext::ident(field),
                self.ctx.types.rust_type(field.ty())?
            ));
        }
        w.close("}");
        Ok(())
    }

    fn emit_encode_into(&self, w: &mut CodeWriter) -> Result<(), CodegenError> {
        w.open("pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), CodecError> {");
        emit_size_check(w);
        w.line("let buf = &mut buf[..Self::SIZE];");

        for (_, field, region) in self.ctx.fields() {
            let Some(region) = region.filter(|r| r.is_fixed()) else {
                continue;
            };
            let ty = self.ctx.fixed_type(field)?;
            let place = Place::value(format!("self.{}", LayoutContext::ident(field)));
            let at = At::Const(self.ctx.start(region)?);
            self.ctx.codec(field.name()).encode_value(&ty, &place, &at, 0, w)?;
        }

        let shared = self.shared_names();
        self.emit_indirect_packing(w, &shared)?;

        for (index, _, region) in self.ctx.fields() {
            let Some(region) = region.filter(|r| r.is_dynamic()) else {
                continue;
            };
            if self.ctx.is_data_region(index) {
                continue;
            }
            self.emit_region_encode(index, region, &shared, w)?;
        }

        for (a, b) in self.ctx.shared_pairs() {
            let (a_stem, b_stem) = (LayoutContext::stem(a.field()), LayoutContext::stem(b.field()));
            w.open(format!("if overlaps({}_used, {}_used) {{", a_stem, b_stem));
            w.line(format!(
                "return Err(CodecError::Overlap {{ first: \"{}\", second: \"{}\" }});",
                a.name(),
                b.name()
            ));
            w.close("}");
        }

        w.line("Ok(())");
        w.close("}");
        Ok(())
    }

    fn shared_names(&self) -> HashSet<&'a str> {
        self.ctx
            .shared_pairs()
            .into_iter()
            .flat_map(|(a, b)| [a.name(), b.name()])
            .collect()
    }

    fn emit_region_encode(
        &self,
        index: usize,
        region: &Region,
        shared: &HashSet<&str>,
        w: &mut CodeWriter,
    ) -> Result<(), CodegenError> {
        let field = region.field();
        let stem = LayoutContext::stem(field);
        let (low, high) = self.ctx.span(region)?;
        let capacity = high - low;
        let elem_size = region.element_size();
        let elem = self.ctx.element(region)?;
        let source = if self.ctx.is_metadata_region(index) {
            format!("{}_items", stem)
        } else {
            format!("self.{}", LayoutContext::ident(field))
        };
        let count = format!("{}_count", stem);
        let base = format!("{}_base", stem);

        match self.ctx.count_expr(region, Receiver::Owned)? {
            Some(expr) => {
                w.line(format!("let {} = {};", count, expr));
                w.open(format!("if {}.len() != {} {{", source, count));
                w.line(format!(
                    "return Err(CodecError::CountMismatch {{ field: \"{}\", count: {}, len: {}.len() }});",
                    region.name(),
                    count,
                    source
                ));
                w.close("}");
            }
            None if elem.is_byte() => w.line(format!("let {} = {}.len();", count, source)),
            None => {
                return Err(CodegenError::InvalidLayout(format!(
                    "{} holds {} but has no count",
                    region.name(),
                    elem
                )))
            }
        }

        emit_capacity_check(region.name(), &count, elem_size, capacity, w);
        emit_base(region, &base, &count, elem_size, w)?;

        if elem.is_byte() {
            w.line(format!("buf[{}..{} + {}].copy_from_slice(&{});", base, base, count, source));
        } else {
            w.open(format!("for (i0, item0) in {}.iter().enumerate() {{", source));
            w.line(format!("let at0 = {} + i0 * {};", base, elem_size));
            self.ctx
                .codec(region.name())
                .encode_value(&elem, &Place::borrowed("item0"), &At::Expr("at0".to_string()), 1, w)?;
            w.close("}");
        }

        if shared.contains(region.name()) {
            w.line(format!("let {}_used = ({}, {} + {});", stem, base, base, scaled(&count, elem_size)));
        }
        Ok(())
    }

    /// Packs indirect payloads into their data regions and patches offset and
    /// size into cloned metadata, which the region pass then encodes.
    fn emit_indirect_packing(&self, w: &mut CodeWriter, shared: &HashSet<&str>) -> Result<(), CodegenError> {
        let indirect = self.ctx.indirect();
        if indirect.is_empty() {
            return Ok(());
        }

        let mut cloned = HashSet::new();
        for entry in indirect {
            if cloned.insert(entry.from) {
                let from = self.ctx.field_at(entry.from)?;
                w.line(format!(
                    "let mut {}_items = self.{}.clone();",
                    LayoutContext::stem(from),
                    LayoutContext::ident(from)
                ));
            }
        }

        let mut packed = Vec::new();
        for entry in indirect {
            if packed.contains(&entry.region) {
                continue;
            }
            packed.push(entry.region);

            let data = self.ctx.region_at(entry.region)?;
            let (low, high) = self.ctx.span(data)?;
            let down = LayoutContext::grows_down(data);
            let cursor = format!("{}_cursor", LayoutContext::stem(data.field()));
            w.line(format!("let mut {} = {};", cursor, if down { high } else { low }));

            for entry in indirect.iter().filter(|i| i.region == entry.region) {
                let field = self.ctx.field_at(entry.field)?;
                let from = self.ctx.field_at(entry.from)?;
                let meta = self.ctx.metadata_struct(entry)?;
                let ident = LayoutContext::ident(field);
                let items = format!("{}_items", LayoutContext::stem(from));

                w.open(format!("if self.{}.len() != {}.len() {{", ident, items));
                w.line(format!(
                    "return Err(CodecError::CountMismatch {{ field: \"{}\", count: {}.len(), len: self.{}.len() }});",
                    field.name(),
                    items,
                    ident
                ));
                w.close("}");

                w.open(format!("for (item, bytes) in {}.iter_mut().zip(&self.{}) {{", items, ident));
                if down {
                    w.open(format!("if {} - {} < bytes.len() {{", cursor, low));
                    w.line(format!(
                        "return Err(CodecError::RegionOverflow {{ field: \"{}\", needed: {} - {} + bytes.len(), capacity: {} }});",
                        field.name(),
                        high,
                        cursor,
                        high - low
                    ));
                    w.close("}");
                    w.line(format!("{} -= bytes.len();", cursor));
                    w.line(format!("let offset = {};", cursor));
                } else {
                    w.open(format!("if {} - {} < bytes.len() {{", high, cursor));
                    w.line(format!(
                        "return Err(CodecError::RegionOverflow {{ field: \"{}\", needed: {} - {} + bytes.len(), capacity: {} }});",
                        field.name(),
                        cursor,
                        low,
                        high - low
                    ));
                    w.close("}");
                    w.line(format!("let offset = {};", cursor));
                    w.line(format!("{} += bytes.len();", cursor));
                }
                w.line("buf[offset..offset + bytes.len()].copy_from_slice(bytes);");
                w.line(format!(
                    "let offset_value = offset.try_into().map_err(|_| CodecError::OffsetOverflow {{ field: \"{}\", value: offset }})?;",
                    field.name()
                ));
                w.line(format!(
                    "let size_value = bytes.len().try_into().map_err(|_| CodecError::OffsetOverflow {{ field: \"{}\", value: bytes.len() }})?;",
                    field.name()
                ));
                w.line(self.ctx.types.member_assign(&meta, "item", &entry.offset_member, "offset_value"));
                w.line(self.ctx.types.member_assign(&meta, "item", &entry.size_member, "size_value"));
                w.close("}");
            }

            if shared.contains(data.name()) {
                let stem = LayoutContext::stem(data.field());
                if down {
                    w.line(format!("let {}_used = ({}, {});", stem, cursor, high));
                } else {
                    w.line(format!("let {}_used = ({}, {});", stem, low, cursor));
                }
            }
        }
        Ok(())
    }

    fn emit_decode(&self, w: &mut CodeWriter) -> Result<(), CodegenError> {
        w.open("pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {");
        emit_size_check(w);
        w.line("let buf = &buf[..Self::SIZE];");

        for (_, field, region) in self.ctx.fields() {
            let Some(region) = region.filter(|r| r.is_fixed()) else {
                continue;
            };
            let ty = self.ctx.fixed_type(field)?;
            let at = At::Const(self.ctx.start(region)?);
            self.ctx
                .codec(field.name())
                .decode_into(&ty, &LayoutContext::ident(field), &at, 0, w)?;
        }

        for (index, _, region) in self.ctx.fields() {
            let Some(region) = region.filter(|r| r.is_dynamic()) else {
                continue;
            };
            if self.ctx.is_data_region(index) {
                continue;
            }
            self.emit_region_decode(region, w)?;
        }

        for entry in self.ctx.indirect() {
            let field = self.ctx.field_at(entry.field)?;
            let from = self.ctx.field_at(entry.from)?;
            let data = self.ctx.region_at(entry.region)?;
            let (low, high) = self.ctx.span(data)?;
            let meta = self.ctx.metadata_struct(entry)?;
            let ident = LayoutContext::ident(field);
            let from_ident = LayoutContext::ident(from);

            w.line(format!("let mut {} = Vec::with_capacity({}.len());", ident, from_ident));
            w.open(format!("for (index, item) in {}.iter().enumerate() {{", from_ident));
            w.line(format!(
                "let offset = item{} as usize;",
                self.ctx.types.member_access(&meta, &entry.offset_member)
            ));
            w.line(format!(
                "let size = item{} as usize;",
                self.ctx.types.member_access(&meta, &entry.size_member)
            ));
            let lower = if low > 0 {
                format!(" if offset >= {} && end <= {}", low, high)
            } else {
                format!(" if end <= {}", high)
            };
            w.open("let end = match offset.checked_add(size) {");
            w.line(format!("Some(end){} => end,", lower));
            w.line(format!(
                "_ => return Err(CodecError::IndirectOutOfRange {{ field: \"{}\", index, offset, size }}),",
                field.name()
            ));
            w.close("};");
            w.line(format!("{}.push(buf[offset..end].to_vec());", ident));
            w.close("}");
        }

        w.open("Ok(Self {");
        for (index, field, _) in self.ctx.fields() {
            if !self.ctx.is_data_region(index) {
                w.line(format!("{},", LayoutContext::ident(field)));
            }
        }
        w.close("})");
        w.close("}");
        Ok(())
    }

    fn emit_region_decode(&self, region: &Region, w: &mut CodeWriter) -> Result<(), CodegenError> {
        let field = region.field();
        let ident = LayoutContext::ident(field);
        let stem = LayoutContext::stem(field);
        let (low, high) = self.ctx.span(region)?;
        let elem_size = region.element_size();
        let elem = self.ctx.element(region)?;
        let count = format!("{}_count", stem);
        let base = format!("{}_base", stem);

        let Some(expr) = self.ctx.count_expr(region, Receiver::Local)? else {
            if !elem.is_byte() {
                return Err(CodegenError::InvalidLayout(format!("{} has no count", region.name())));
            }
            w.line(format!("let {} = buf[{}..{}].to_vec();", ident, low, high));
            return Ok(());
        };

        w.line(format!("let {} = {};", count, expr));
        emit_capacity_check(region.name(), &count, elem_size, high - low, w);
        emit_base(region, &base, &count, elem_size, w)?;

        if elem.is_byte() {
            w.line(format!("let {} = buf[{}..{} + {}].to_vec();", ident, base, base, count));
            return Ok(());
        }

        w.line(format!("let mut {} = Vec::with_capacity({});", ident, count));
        w.open(format!("for i0 in 0..{} {{", count));
        w.line(format!("let at0 = {} + i0 * {};", base, elem_size));
        self.ctx
            .codec(region.name())
            .decode_into(&elem, "value", &At::Expr("at0".to_string()), 1, w)?;
        w.line(format!("{}.push(value);", ident));
        w.close("}");
        Ok(())
    }
}

fn emit_size_check(w: &mut CodeWriter) {
    w.open("if buf.len() < Self::SIZE {");
    w.line("return Err(CodecError::BufferSize { expected: Self::SIZE, actual: buf.len() });");
    w.close("}");
}

fn scaled(count: &str, elem_size: usize) -> String {
    if elem_size == 1 {
        count.to_string()
    } else {
        format!("{} * {}", count, elem_size)
    }
}

pub(crate) fn emit_capacity_check(name: &str, count: &str, elem_size: usize, capacity: usize, w: &mut CodeWriter) {
    let max = capacity / elem_size.max(1);
    w.open(format!("if {} > {} {{", count, max));
    let needed = if elem_size == 1 {
        count.to_string()
    } else {
        format!("{}.saturating_mul({})", count, elem_size)
    };
    w.line(format!(
        "return Err(CodecError::RegionOverflow {{ field: \"{}\", needed: {}, capacity: {} }});",
        name, needed, capacity
    ));
    w.close("}");
}

/// Lowest byte of the occupied part; `end-start` data ends at its start.
pub(crate) fn emit_base(
    region: &Region,
    base: &str,
    count: &str,
    elem_size: usize,
    w: &mut CodeWriter,
) -> Result<(), CodegenError> {
    let start = region
        .start()
        .ok_or_else(|| CodegenError::InvalidLayout(format!("{} has no resolved start", region.name())))?;
    if LayoutContext::grows_down(region) {
        w.line(format!("let {} = {} - {};", base, start, scaled(count, elem_size)));
    } else {
        w.line(format!("let {} = {};", base, start));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::codegen::types::TypeMapper;
    use crate::layout::{TypeAnnotation, TypeLayout, TypeLayoutBuilder, TypeRegistry};
    use std::collections::HashMap;

    fn render(layout: &TypeLayout, registry: &TypeRegistry) -> String {
        let analyzed = analyze(layout, registry);
        assert!(analyzed.is_valid(), "{:?}", analyzed.errors());
        let modes = HashMap::new();
        let types = TypeMapper::new(registry, &modes);
        let ctx = LayoutContext::new(layout, &analyzed, &types);
        let derives = vec!["Debug".to_string(), "PartialEq".to_string()];
        let mut w = CodeWriter::new();
        CopyEmitter::new(&ctx, &derives).emit(&mut w).unwrap();
        w.finish()
    }

    fn page(tag: &str) -> TypeLayout {
        TypeLayoutBuilder::new("Page")
            .annotation(TypeAnnotation::parse(tag).unwrap())
            .field("Header", "uint16", "@0")
            .field("Body", "[]byte", "start-end")
            .field("Footer", "uint64", "@4088")
            .build()
            .unwrap()
    }

    #[test]
    fn test_page_little_endian() {
        let out = render(&page("@layout size=4096"), &TypeRegistry::new());
        assert!(out.contains("pub struct Page {"));
        assert!(out.contains("#[derive(Debug, PartialEq)]"));
        assert!(out.contains("pub body: Vec<u8>,"));
        assert!(out.contains("pub const SIZE: usize = 4096;"));
        assert!(out.contains("buf[0..2].copy_from_slice(&self.header.to_le_bytes());"));
        assert!(out.contains("let body = buf[2..4088].to_vec();"));
        assert!(out.contains("if body_count > 4086 {"));
        assert!(out.contains("let footer = u64::from_le_bytes(read_array(buf, 4088));"));
        assert!(!out.contains("to_be_bytes"));
    }

    #[test]
    fn test_page_big_endian() {
        let out = render(&page("@layout size=4096 endian=big"), &TypeRegistry::new());
        assert!(out.contains("to_be_bytes"));
        assert!(out.contains("from_be_bytes"));
        assert!(!out.contains("to_le_bytes"));
    }

    #[test]
    fn test_counted_struct_slice() {
        let mut registry = TypeRegistry::new();
        let header = TypeLayoutBuilder::new("LeafHeader")
            .field("NumKeys", "uint16", "@0")
            .build()
            .unwrap();
        registry.register("LeafHeader", 16);
        registry.register_members("LeafHeader", header.members());
        registry.register("LeafElement", 8);

        let layout = TypeLayoutBuilder::new("LeafNode")
            .size(4096)
            .field("Header", "LeafHeader", "@0")
            .field("Elements", "[]LeafElement", "start-end,count=Header.NumKeys")
            .field("Footer", "uint64", "@4088")
            .build()
            .unwrap();
        let out = render(&layout, &registry);
        assert!(out.contains("self.header.encode_into(&mut buf[0..16])?;"));
        assert!(out.contains("let elements_count = self.header.num_keys as usize;"));
        assert!(out.contains("if self.elements.len() != elements_count {"));
        assert!(out.contains("if elements_count > 509 {"));
        assert!(out.contains("item0.encode_into(&mut buf[at0..at0 + 8])?;"));
        assert!(out.contains("let header = LeafHeader::decode(&buf[0..16])?;"));
        assert!(out.contains("let elements_count = header.num_keys as usize;"));
        assert!(out.contains("let value = LeafElement::decode(&buf[at0..at0 + 8])?;"));
    }

    #[test]
    fn test_end_start_region_stored_below_start() {
        let layout = TypeLayoutBuilder::new("Slotted")
            .size(256)
            .field("Count", "uint16", "@0")
            .field("Slots", "[]uint16", "start-end,count=Count")
            .field("Data", "[]byte", "end-start")
            .build()
            .unwrap();
        let out = render(&layout, &TypeRegistry::new());
        assert!(out.contains("let slots_base = 2;"));
        assert!(out.contains("let data_base = 256 - data_count;"));
        assert!(out.contains("buf[at0..at0 + 2].copy_from_slice(&item0.to_le_bytes());"));
        assert!(out.contains("if overlaps(slots_used, data_used) {"));
        assert!(out.contains("let data = buf[2..256].to_vec();"));
    }

    #[test]
    fn test_indirect_slices() {
        let mut registry = TypeRegistry::new();
        let elem = TypeLayoutBuilder::new("Slot")
            .field("Offset", "uint16", "@0")
            .field("Size", "uint16", "@2")
            .build()
            .unwrap();
        registry.register("Slot", 4);
        registry.register_members("Slot", elem.members());

        let layout = TypeLayoutBuilder::new("Record")
            .size(512)
            .field("Count", "uint16", "@0")
            .field("Slots", "[]Slot", "start-end,count=Count")
            .field("Heap", "[]byte", "end-start")
            .field("Values", "[][]byte", "from=Slots,offset=Offset,size=Size,region=Heap")
            .build()
            .unwrap();
        let out = render(&layout, &registry);
        assert!(out.contains("#[derive(Debug, PartialEq, Clone)]"));
        assert!(out.contains("pub values: Vec<Vec<u8>>,"));
        assert!(!out.contains("pub heap"));
        assert!(out.contains("let mut slots_items = self.slots.clone();"));
        assert!(out.contains("let mut heap_cursor = 512;"));
        assert!(out.contains("item.offset = offset_value;"));
        assert!(out.contains("item.size = size_value;"));
        assert!(out.contains("for (i0, item0) in slots_items.iter().enumerate() {"));
        assert!(out.contains("let heap_used = (heap_cursor, 512);"));
        assert!(out.contains("Some(end) if offset >= 2 && end <= 512 => end,"));
    }
}
