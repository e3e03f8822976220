// Tue Jan 13 2026 - Alex

use crate::layout::{Field, FieldLayout, LayoutError, Member, TypeAnnotation, TypeRegistry};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct TypeLayout {
    name: String,
    annotation: TypeAnnotation,
    fields: IndexMap<String, Field>,
}

impl TypeLayout {
    pub fn new(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        Self {
            name: name.into(),
            annotation,
            fields: IndexMap::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), LayoutError> {
        if self.fields.contains_key(field.name()) {
            return Err(LayoutError::DuplicateField(field.name().to_string()));
        }
        self.fields.insert(field.name().to_string(), field);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &TypeAnnotation {
        &self.annotation
    }

    pub fn buffer_size(&self) -> usize {
        self.annotation.size
    }

    pub fn set_annotation(&mut self, annotation: TypeAnnotation) {
        self.annotation = annotation;
    }

    pub fn set_buffer_size(&mut self, size: usize) {
        self.annotation.size = size;
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> + '_ {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get_index(index).map(|(_, field)| field)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Smallest buffer holding every fixed field: the largest `offset + size`.
    /// Fields whose type cannot be sized are skipped here and reported by analysis.
    pub fn infer_size(&self, registry: &TypeRegistry) -> Result<usize, LayoutError> {
        let mut max_end = 0usize;
        for field in self.fields() {
            if let FieldLayout::Fixed { offset } = field.layout() {
                match registry.size_of(field.ty()) {
                    Ok(size) => {
                        if let Some(size) = size.fixed() {
                            max_end = max_end.max(offset.saturating_add(size));
                        }
                    }
                    Err(e) => log::debug!("Skipping {}.{} while sizing: {}", self.name, field.name(), e),
                }
            }
        }

        if max_end == 0 {
            return Err(LayoutError::UnresolvableSize(self.name.clone()));
        }
        Ok(max_end)
    }

    /// Fixed-offset fields, exposed to nested count references.
    pub fn members(&self) -> Vec<Member> {
        self.fields()
            .filter_map(|field| match field.layout() {
                FieldLayout::Fixed { offset } => Some(Member::new(field.name(), field.ty().clone(), *offset)),
                _ => None,
            })
            .collect()
    }
}
