// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::layout::{Field, FieldLayout, LayoutError, TypeRef, TypeRegistry, TypeSize};

/// Turns one field into a region. Indirect slices occupy no bytes of their
/// own and yield `None`.
pub fn build_region(
    field: &Field,
    field_index: usize,
    buffer_size: usize,
    registry: &TypeRegistry,
) -> Result<Option<Region>, LayoutError> {
    match field.layout() {
        FieldLayout::Fixed { offset } => build_fixed(field, field_index, *offset, buffer_size, registry).map(Some),
        FieldLayout::Dynamic { growth, anchor, .. } => {
            if let Some(at) = anchor {
                if *at > buffer_size {
                    return Err(LayoutError::ExceedsBuffer {
                        field: field.name().to_string(),
                        start: *at,
                        boundary: *at,
                        buffer_size,
                    });
                }
            }
            let (element_type, element_size) = element_of(field, registry)?;
            Ok(Some(Region::dynamic(
                field,
                field_index,
                (*growth).into(),
                *anchor,
                element_type,
                element_size,
            )))
        }
        FieldLayout::Indirect(_) => Ok(None),
    }
}

fn build_fixed(
    field: &Field,
    field_index: usize,
    offset: usize,
    buffer_size: usize,
    registry: &TypeRegistry,
) -> Result<Region, LayoutError> {
    let size = match registry.size_of(field.ty()) {
        Ok(TypeSize::Fixed(size)) => size,
        Ok(TypeSize::Dynamic) => {
            return Err(LayoutError::DynamicInFixedField {
                field: field.name().to_string(),
                ty: field.ty().to_string(),
            })
        }
        Err(e) => return Err(LayoutError::in_field(field.name(), e)),
    };

    let boundary = offset.checked_add(size).filter(|end| *end <= buffer_size);
    match boundary {
        Some(_) => Ok(Region::fixed(field, field_index, offset, size)),
        None => Err(LayoutError::ExceedsBuffer {
            field: field.name().to_string(),
            start: offset,
            boundary: offset.saturating_add(size),
            buffer_size,
        }),
    }
}

fn element_of(field: &Field, registry: &TypeRegistry) -> Result<(TypeRef, usize), LayoutError> {
    let not_a_slice = || LayoutError::NotASlice {
        field: field.name().to_string(),
        ty: field.ty().to_string(),
    };

    match registry.size_of(field.ty()) {
        Ok(TypeSize::Dynamic) => {}
        Ok(TypeSize::Fixed(_)) => return Err(not_a_slice()),
        Err(e) => return Err(LayoutError::in_field(field.name(), e)),
    }

    let resolved = registry
        .resolve(field.ty())
        .map_err(|e| LayoutError::in_field(field.name(), e))?;
    let element = match resolved {
        TypeRef::Slice(element) => *element,
        _ => return Err(not_a_slice()),
    };

    match registry.size_of(&element) {
        Ok(TypeSize::Fixed(0)) => Err(LayoutError::ZeroSizedElement {
            field: field.name().to_string(),
            element: element.to_string(),
        }),
        Ok(TypeSize::Fixed(size)) => Ok((element, size)),
        Ok(TypeSize::Dynamic) => Err(LayoutError::NestedDynamicNotSupported {
            field: field.name().to_string(),
            element: element.to_string(),
        }),
        Err(e) => Err(LayoutError::in_field(field.name(), e)),
    }
}
