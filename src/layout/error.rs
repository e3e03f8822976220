// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Unknown type: {0} (not registered)")]
    UnknownType(String),
    #[error("Unsupported type: {0} (pointers have no binary layout)")]
    UnsupportedType(String),
    #[error("Array of dynamic type not supported: {0}")]
    ArrayOfDynamicType(String),
    #[error("Cyclic type alias: {}", .0.join(" -> "))]
    CyclicAlias(Vec<String>),
    #[error("Invalid type notation: {0}")]
    InvalidTypeNotation(String),
    #[error("Field {field}: {source}")]
    InField {
        field: String,
        #[source]
        source: Box<LayoutError>,
    },
    #[error("Field {field}: [{start}, {boundary}) exceeds buffer size {buffer_size}")]
    ExceedsBuffer {
        field: String,
        start: usize,
        boundary: usize,
        buffer_size: usize,
    },
    #[error("Field {field}: dynamic field must be a slice type, got {ty}")]
    NotASlice { field: String, ty: String },
    #[error("Field {field}: fixed field cannot have dynamic type {ty}")]
    DynamicInFixedField { field: String, ty: String },
    #[error("Field {field}: element type {element} is itself dynamic")]
    NestedDynamicNotSupported { field: String, element: String },
    #[error("Field {field}: element type {element} has zero size")]
    ZeroSizedElement { field: String, element: String },
    #[error("Field {field} (type {ty}) requires count= ({reason})")]
    CountRequired {
        field: String,
        ty: String,
        reason: &'static str,
    },
    #[error("Count field {count_field} has type {ty}, expected an integer type")]
    InvalidCountFieldType { count_field: String, ty: String },
    #[error(
        "Count field {count_field} ({ty}, max {max_value}) cannot address {max_elements} elements of {field}"
    )]
    CountOverflow {
        field: String,
        count_field: String,
        ty: String,
        max_value: u64,
        max_elements: u64,
    },
    #[error("Field {field}: count field {count_field} not found")]
    UnknownCountField { field: String, count_field: String },
    #[error("Field {field}: invalid nested count reference {count_field} (expected Parent.Child)")]
    InvalidNestedReference { field: String, count_field: String },
    #[error("Collision: {first} [{first_start}, {first_end}) overlaps {second} [{second_start}, {second_end})")]
    Collision {
        first: String,
        first_start: usize,
        first_end: usize,
        second: String,
        second_start: usize,
        second_end: usize,
    },
    #[error("Field {field}: region [{start}, {boundary}) has no room")]
    DegenerateRegion {
        field: String,
        start: usize,
        boundary: usize,
    },
    #[error("Field {field}: invalid indirect slice ({reason})")]
    InvalidIndirectSlice { field: String, reason: String },
    #[error("Duplicate field: {0}")]
    DuplicateField(String),
    #[error("Cannot determine buffer size of {0}: no fixed fields and no size annotation")]
    UnresolvableSize(String),
    #[error("Invalid tag `{tag}`: {reason}")]
    InvalidTag { tag: String, reason: String },
    #[error("Invalid annotation `{text}`: {reason}")]
    InvalidAnnotation { text: String, reason: String },
}

impl LayoutError {
    pub fn in_field(field: impl Into<String>, source: LayoutError) -> Self {
        Self::InField {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Strips field context and returns the underlying failure.
    pub fn root(&self) -> &LayoutError {
        match self {
            Self::InField { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InField { field, .. }
            | Self::ExceedsBuffer { field, .. }
            | Self::NotASlice { field, .. }
            | Self::DynamicInFixedField { field, .. }
            | Self::NestedDynamicNotSupported { field, .. }
            | Self::ZeroSizedElement { field, .. }
            | Self::CountRequired { field, .. }
            | Self::CountOverflow { field, .. }
            | Self::UnknownCountField { field, .. }
            | Self::InvalidNestedReference { field, .. }
            | Self::DegenerateRegion { field, .. }
            | Self::InvalidIndirectSlice { field, .. } => Some(field),
            Self::Collision { first, .. } => Some(first),
            Self::DuplicateField(field) => Some(field),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::UnknownType(_) => "unknown_type",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::ArrayOfDynamicType(_) => "array_of_dynamic_type",
            Self::CyclicAlias(_) => "cyclic_alias",
            Self::InvalidTypeNotation(_) => "invalid_type_notation",
            Self::InField { .. } => "in_field",
            Self::ExceedsBuffer { .. } => "exceeds_buffer",
            Self::NotASlice { .. } => "not_a_slice",
            Self::DynamicInFixedField { .. } => "dynamic_in_fixed_field",
            Self::NestedDynamicNotSupported { .. } => "nested_dynamic_not_supported",
            Self::ZeroSizedElement { .. } => "zero_sized_element",
            Self::CountRequired { .. } => "count_required",
            Self::InvalidCountFieldType { .. } => "invalid_count_field_type",
            Self::CountOverflow { .. } => "count_overflow",
            Self::UnknownCountField { .. } => "unknown_count_field",
            Self::InvalidNestedReference { .. } => "invalid_nested_reference",
            Self::Collision { .. } => "collision",
            Self::DegenerateRegion { .. } => "degenerate_region",
            Self::InvalidIndirectSlice { .. } => "invalid_indirect_slice",
            Self::DuplicateField(_) => "duplicate_field",
            Self::UnresolvableSize(_) => "unresolvable_size",
            Self::InvalidTag { .. } => "invalid_tag",
            Self::InvalidAnnotation { .. } => "invalid_annotation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_field_context() {
        let err = LayoutError::in_field("Header", LayoutError::UnknownType("Foo".to_string()));
        assert_eq!(err.root(), &LayoutError::UnknownType("Foo".to_string()));
        assert_eq!(err.field(), Some("Header"));
        assert_eq!(err.kind(), "unknown_type");
    }

    #[test]
    fn test_display_mentions_field_and_type() {
        let err = LayoutError::in_field("Header", LayoutError::UnknownType("Foo".to_string()));
        let text = err.to_string();
        assert!(text.contains("Header"));
        assert!(text.contains("Foo"));
    }

    #[test]
    fn test_cyclic_alias_display() {
        let err = LayoutError::CyclicAlias(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(err.to_string(), "Cyclic type alias: A -> B -> A");
    }
}
