// Tue Jan 13 2026 - Alex

use crate::layout::{AnnotationDefaults, Field, LayoutError, TypeAnnotation, TypeLayout, TypeRef, TypeRegistry};
use crate::schema::{LayoutDecl, SchemaDocument};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Schema has {} invalid declaration(s)", .0.len())]
    Invalid(Vec<DeclError>),
}

/// A declaration error tagged with the alias or layout it came from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{owner}: {error}")]
pub struct DeclError {
    pub owner: String,
    pub error: LayoutError,
}

#[derive(Debug, Clone)]
pub struct Schema {
    layouts: Vec<TypeLayout>,
    registry: TypeRegistry,
}

impl Schema {
    pub fn load(path: &Path, defaults: AnnotationDefaults) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read schema {} ({} bytes)", path.display(), content.len());
        Self::from_json(&content, defaults)
    }

    pub fn from_json(json: &str, defaults: AnnotationDefaults) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(&document, defaults)
    }

    /// Registers aliases, then each layout in declaration order so later
    /// layouts can embed earlier ones by name.
    pub fn from_document(document: &SchemaDocument, defaults: AnnotationDefaults) -> Result<Self, SchemaError> {
        let mut registry = TypeRegistry::new();
        let mut errors = Vec::new();

        for (alias, notation) in &document.aliases {
            match TypeRef::parse(notation) {
                Ok(target) => registry.register_alias(alias, target),
                Err(error) => errors.push(DeclError {
                    owner: alias.clone(),
                    error,
                }),
            }
        }

        let mut layouts = Vec::with_capacity(document.layouts.len());
        for decl in &document.layouts {
            match build_layout(decl, defaults, &registry) {
                Ok(layout) => {
                    registry.register(layout.name(), layout.buffer_size());
                    registry.register_members(layout.name(), layout.members());
                    layouts.push(layout);
                }
                Err(decl_errors) => errors.extend(decl_errors.into_iter().map(|error| DeclError {
                    owner: decl.name.clone(),
                    error,
                })),
            }
        }

        if !errors.is_empty() {
            return Err(SchemaError::Invalid(errors));
        }

        log::info!(
            "Loaded {} layout(s), {} alias(es)",
            layouts.len(),
            document.aliases.len()
        );
        Ok(Self { layouts, registry })
    }

    pub fn layouts(&self) -> &[TypeLayout] {
        &self.layouts
    }

    pub fn layout(&self, name: &str) -> Option<&TypeLayout> {
        self.layouts.iter().find(|l| l.name() == name)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

fn build_layout(
    decl: &LayoutDecl,
    defaults: AnnotationDefaults,
    registry: &TypeRegistry,
) -> Result<TypeLayout, Vec<LayoutError>> {
    let mut errors = Vec::new();

    let annotation = TypeAnnotation::parse_with(&decl.annotation, defaults).unwrap_or_else(|e| {
        errors.push(e);
        TypeAnnotation::default()
    });

    let mut layout = TypeLayout::new(&decl.name, annotation);
    for field in &decl.fields {
        let added = Field::parse(&field.name, &field.ty, &field.tag).and_then(|f| layout.add_field(f));
        if let Err(e) = added {
            errors.push(e);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    if layout.buffer_size() == 0 {
        let size = layout.infer_size(registry).map_err(|e| vec![e])?;
        log::debug!("Inferred size of {}: {} bytes", layout.name(), size);
        layout.set_buffer_size(size);
    }

    Ok(layout)
}
