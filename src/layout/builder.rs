// Tue Jan 13 2026 - Alex

use crate::layout::{Field, FieldLayout, LayoutError, TypeAnnotation, TypeLayout, TypeRef};

pub struct TypeLayoutBuilder {
    layout: TypeLayout,
    errors: Vec<LayoutError>,
}

impl TypeLayoutBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            layout: TypeLayout::new(name, TypeAnnotation::default()),
            errors: Vec::new(),
        }
    }

    pub fn annotation(mut self, annotation: TypeAnnotation) -> Self {
        self.layout.set_annotation(annotation);
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.layout.set_buffer_size(size);
        self
    }

    pub fn field(mut self, name: &str, notation: &str, tag: &str) -> Self {
        match Field::parse(name, notation, tag) {
            Ok(field) => self.push(field),
            Err(e) => self.errors.push(e),
        }
        self
    }

    pub fn typed_field(mut self, name: &str, ty: TypeRef, layout: FieldLayout) -> Self {
        self.push(Field::new(name, ty, layout));
        self
    }

    fn push(&mut self, field: Field) {
        if let Err(e) = self.layout.add_field(field) {
            self.errors.push(e);
        }
    }

    /// Returns the layout, or the first error met while adding fields.
    pub fn build(mut self) -> Result<TypeLayout, LayoutError> {
        if self.errors.is_empty() {
            Ok(self.layout)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Endian, Mode, PrimitiveType};

    #[test]
    fn test_builder_collects_fields() {
        let layout = TypeLayoutBuilder::new("Page")
            .size(4096)
            .field("Header", "uint16", "@0")
            .field("Body", "[]byte", "start-end")
            .build()
            .unwrap();
        assert_eq!(layout.name(), "Page");
        assert_eq!(layout.buffer_size(), 4096);
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn test_builder_reports_bad_tag() {
        let err = TypeLayoutBuilder::new("Page")
            .field("Header", "uint16", "@zero")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_tag");
    }

    #[test]
    fn test_annotation_after_fields_keeps_fields() {
        let layout = TypeLayoutBuilder::new("Page")
            .field("Header", "uint16", "@0")
            .annotation(TypeAnnotation::new(64).zerocopy())
            .build()
            .unwrap();
        assert_eq!(layout.len(), 1);
        assert!(layout.annotation().is_zerocopy());
    }

    #[test]
    fn test_typed_field_and_annotation_setters() {
        let layout = TypeLayoutBuilder::new("Record")
            .annotation(TypeAnnotation::new(32).with_endian(Endian::Big).with_mode(Mode::Copy))
            .typed_field("Len", TypeRef::Primitive(PrimitiveType::U8), FieldLayout::fixed(0))
            .typed_field(
                "Data",
                TypeRef::slice_of(TypeRef::Primitive(PrimitiveType::Byte)),
                FieldLayout::start_end().anchored(1).with_count("Len"),
            )
            .build()
            .unwrap();
        assert_eq!(layout.annotation().endian, Endian::Big);
        assert_eq!(layout.len(), 2);
        assert!(layout.fields().all(|f| !f.is_indirect()));
    }
}
