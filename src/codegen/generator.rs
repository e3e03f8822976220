// Tue Jan 13 2026 - Alex

use crate::analysis::AnalyzedLayout;
use crate::codegen::context::LayoutContext;
use crate::codegen::copy::CopyEmitter;
use crate::codegen::template::TemplateEngine;
use crate::codegen::types::TypeMapper;
use crate::codegen::zerocopy::ZeroCopyEmitter;
use crate::codegen::{CodeWriter, CodegenError};
use crate::config::Config;
use crate::layout::{ModeKind, TypeLayout, TypeRef, TypeRegistry};
use crate::utils::logging::ScopedTimer;
use std::collections::HashMap;

pub struct Generator<'a> {
    registry: &'a TypeRegistry,
    config: &'a Config,
    modes: HashMap<String, ModeKind>,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a TypeRegistry, config: &'a Config) -> Self {
        Self {
            registry,
            config,
            modes: HashMap::new(),
        }
    }

    /// Records each layout's mode so nested accesses use fields or accessors.
    pub fn with_layouts(mut self, layouts: &[TypeLayout]) -> Self {
        for layout in layouts {
            self.modes
                .insert(layout.name().to_string(), layout.annotation().mode.kind());
        }
        self
    }

    /// Code for one layout. The layout must have passed analysis.
    pub fn generate(&self, layout: &TypeLayout, analyzed: &AnalyzedLayout) -> Result<String, CodegenError> {
        if analyzed.type_name() != layout.name() {
            return Err(CodegenError::InvalidLayout(format!(
                "analysis of {} does not belong to {}",
                analyzed.type_name(),
                layout.name()
            )));
        }
        if !analyzed.is_valid() {
            return Err(CodegenError::InvalidLayout(format!(
                "{} has {} unresolved error(s)",
                layout.name(),
                analyzed.errors().len()
            )));
        }

        let _timer = ScopedTimer::new(format!("generate {}", layout.name()));
        let types = TypeMapper::new(self.registry, &self.modes);
        let ctx = LayoutContext::new(layout, analyzed, &types);
        let mut w = CodeWriter::new();

        let mode = layout.annotation().mode.kind();
        match mode {
            ModeKind::Copy => CopyEmitter::new(&ctx, &self.config.derives)
                .with_struct_definition(self.config.emit_struct_definitions)
                .emit(&mut w)?,
            ModeKind::ZeroCopy => {
                let mut engine = built_in_engine();
                ZeroCopyEmitter::new(&ctx).emit(&mut engine, &mut w)?
            }
        }

        log::info!("Generated {} ({} mode, {} bytes)", layout.name(), mode, analyzed.buffer_size());
        Ok(w.finish())
    }

    /// A complete source file: header, codec runtime, aliases, then every layout.
    pub fn generate_file(
        &self,
        items: &[(&TypeLayout, &AnalyzedLayout)],
        source: Option<&str>,
    ) -> Result<String, CodegenError> {
        let mut engine = built_in_engine();
        engine.set_variable("version", env!("CARGO_PKG_VERSION"));
        if let Some(source) = source {
            engine.set_variable("source", source);
        }

        let mut w = CodeWriter::new();
        w.raw(&engine.render("file_header")?);
        w.blank();
        w.raw(&engine.render("codec_error")?);

        let types = TypeMapper::new(self.registry, &self.modes);
        let aliases: Vec<(&str, &TypeRef)> = self.registry.aliases().collect();
        if !aliases.is_empty() {
            w.blank();
            for (alias, target) in &aliases {
                if !is_referenced(alias, items, &aliases) {
                    log::warn!("Alias {} is not used by any layout", alias);
                }
                w.line(format!("pub type {} = {};", alias, types.rust_type(target)?));
            }
        }

        for (layout, analyzed) in items {
            w.blank();
            w.raw(&self.generate(layout, analyzed)?);
        }

        Ok(w.finish())
    }
}

fn built_in_engine() -> TemplateEngine {
    let mut engine = TemplateEngine::new();
    engine.load_built_in_templates();
    engine
}

fn mentions(ty: &TypeRef, name: &str) -> bool {
    match ty {
        TypeRef::Named(n) => n == name,
        TypeRef::Array(_, elem) | TypeRef::Slice(elem) | TypeRef::Pointer(elem) => mentions(elem, name),
        TypeRef::Primitive(_) => false,
    }
}

fn is_referenced(alias: &str, items: &[(&TypeLayout, &AnalyzedLayout)], aliases: &[(&str, &TypeRef)]) -> bool {
    items
        .iter()
        .flat_map(|(layout, _)| layout.fields())
        .any(|f| mentions(f.ty(), alias))
        || aliases.iter().any(|(other, target)| *other != alias && mentions(target, alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::layout::AnnotationDefaults;
    use crate::schema::Schema;

    const SCHEMA: &str = r#"{
        "aliases": { "PageID": "uint64" },
        "layouts": [
            { "name": "LeafHeader", "annotation": "@layout",
              "fields": [
                { "name": "NumKeys", "type": "uint16", "tag": "@0" },
                { "name": "Next", "type": "PageID", "tag": "@8" }
              ] },
            { "name": "LeafElement",
              "fields": [
                { "name": "Key", "type": "uint32", "tag": "@0" },
                { "name": "Offset", "type": "uint32", "tag": "@4" }
              ] },
            { "name": "LeafNode", "annotation": "@layout size=4096 mode=zerocopy align=512",
              "fields": [
                { "name": "Header", "type": "LeafHeader", "tag": "@0" },
                { "name": "Elements", "type": "[]LeafElement", "tag": "start-end,count=Header.NumKeys" },
                { "name": "Footer", "type": "uint64", "tag": "@4088" }
              ] }
        ]
    }"#;

    #[test]
    fn test_generate_file() {
        let schema = Schema::from_json(SCHEMA, AnnotationDefaults::default()).unwrap();
        let config = Config::default();
        let analyzed: Vec<AnalyzedLayout> = schema
            .layouts()
            .iter()
            .map(|l| analyze(l, schema.registry()))
            .collect();
        let items: Vec<(&TypeLayout, &AnalyzedLayout)> = schema.layouts().iter().zip(analyzed.iter()).collect();

        let generator = Generator::new(schema.registry(), &config).with_layouts(schema.layouts());
        let out = generator.generate_file(&items, Some("btree.json")).unwrap();

        assert!(out.starts_with("// Code generated by binlayout"));
        assert!(out.contains("// Source: btree.json"));
        assert!(out.contains("pub enum CodecError"));
        assert!(out.contains("pub type PageID = u64;"));
        assert!(out.contains("pub struct LeafHeader {"));
        assert!(out.contains("pub next: PageID,"));
        assert!(out.contains("pub struct LeafElement {"));
        assert!(out.contains("pub const REQUIRED: usize = 4096 + 511;"));
        assert!(out.contains("pub fn elements_at(&self, index: usize) -> Result<LeafElement, CodecError> {"));
        assert!(out.contains("let count = self.header()?.num_keys as usize;"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_rejects_invalid_analysis() {
        let schema = Schema::from_json(
            r#"{ "layouts": [ { "name": "Bad", "annotation": "size=8",
                "fields": [ { "name": "A", "type": "uint64", "tag": "@0" },
                            { "name": "B", "type": "uint32", "tag": "@4" } ] } ] }"#,
            AnnotationDefaults::default(),
        )
        .unwrap();
        let layout = &schema.layouts()[0];
        let analyzed = analyze(layout, schema.registry());
        assert!(!analyzed.is_valid());

        let config = Config::default();
        let generator = Generator::new(schema.registry(), &config);
        assert!(matches!(
            generator.generate(layout, &analyzed),
            Err(CodegenError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_struct_definitions_can_be_omitted() {
        let schema = Schema::from_json(SCHEMA, AnnotationDefaults::default()).unwrap();
        let config = Config {
            emit_struct_definitions: false,
            ..Config::default()
        };
        let layout = schema.layout("LeafElement").unwrap();
        let analyzed = analyze(layout, schema.registry());
        let out = Generator::new(schema.registry(), &config)
            .generate(layout, &analyzed)
            .unwrap();
        assert!(!out.contains("pub struct LeafElement"));
        assert!(out.contains("impl LeafElement {"));
        assert!(out.contains("let key = u32::from_le_bytes(read_array(buf, 0));"));
    }
}
