// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::layout::{Direction, LayoutError, PrimitiveType, TypeLayout, TypeRef, TypeRegistry};

const STRUCT_SLICE: &str = "struct slices must specify element count";
const NO_FIXED_BOUNDARY: &str = "no fixed boundary";

/// Checks that every dynamic region can know how many elements it holds and
/// that its count field is wide enough for the space it governs.
pub fn validate_count_fields(
    regions: &[Region],
    layout: &TypeLayout,
    registry: &TypeRegistry,
    buffer_size: usize,
) -> Vec<LayoutError> {
    let mut errors = Vec::new();

    for region in regions.iter().filter(|r| r.is_dynamic()) {
        let count_required = |reason| LayoutError::CountRequired {
            field: region.name().to_string(),
            ty: region.field().ty().to_string(),
            reason,
        };

        let Some(count_field) = region.count_field() else {
            if !region.is_byte_slice() {
                errors.push(count_required(STRUCT_SLICE));
            } else if needs_count(region, regions, buffer_size) {
                errors.push(count_required(NO_FIXED_BOUNDARY));
            }
            continue;
        };

        match count_field_type(region, count_field, layout, registry) {
            Ok(Some(count_type)) => {
                if let Err(e) = check_capacity(region, count_field, count_type) {
                    errors.push(e);
                }
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    errors
}

/// A byte slice can stop at a fixed neighbour on its own. It needs a count when
/// it runs to the buffer edge while another dynamic region competes for that side.
fn needs_count(region: &Region, regions: &[Region], buffer_size: usize) -> bool {
    let Some(start) = region.start() else {
        return false;
    };
    match region.direction() {
        Direction::EndStart => {
            region.boundary() == Some(0)
                && regions
                    .iter()
                    .any(|r| r.is_dynamic() && r.start().map(|s| s < start).unwrap_or(false))
        }
        Direction::StartEnd => {
            region.boundary() == Some(buffer_size)
                && regions
                    .iter()
                    .any(|r| r.is_dynamic() && r.start().map(|s| s > start).unwrap_or(false))
        }
        Direction::Fixed => false,
    }
}

/// Resolves a count reference to its integer type. A nested `Parent.Child`
/// reference only needs `Parent` to exist; the member is not typed here, so
/// it comes back as `Ok(None)` and skips the capacity check.
fn count_field_type(
    region: &Region,
    count_field: &str,
    layout: &TypeLayout,
    registry: &TypeRegistry,
) -> Result<Option<PrimitiveType>, LayoutError> {
    let unknown = || LayoutError::UnknownCountField {
        field: region.name().to_string(),
        count_field: count_field.to_string(),
    };

    if count_field.contains('.') {
        let parts: Vec<&str> = count_field.split('.').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(LayoutError::InvalidNestedReference {
                field: region.name().to_string(),
                count_field: count_field.to_string(),
            });
        }
        layout.field(parts[0]).ok_or_else(unknown)?;
        log::debug!("{}: nested count {} accepted untyped", region.name(), count_field);
        return Ok(None);
    }

    let field = layout.field(count_field).ok_or_else(unknown)?;
    integer_type(field.ty(), count_field, registry).map(Some)
}

fn integer_type(ty: &TypeRef, count_field: &str, registry: &TypeRegistry) -> Result<PrimitiveType, LayoutError> {
    let invalid = || LayoutError::InvalidCountFieldType {
        count_field: count_field.to_string(),
        ty: ty.to_string(),
    };
    match registry.resolve(ty) {
        Ok(TypeRef::Primitive(p)) if p.is_integer() => Ok(p),
        _ => Err(invalid()),
    }
}

fn check_capacity(region: &Region, count_field: &str, count_type: PrimitiveType) -> Result<(), LayoutError> {
    let Some(limit) = count_type.count_limit() else {
        return Ok(());
    };

    let space = region.capacity().unwrap_or(0) as u64;
    let element_size = region.element_size().max(1) as u64;
    let max_elements = space.div_ceil(element_size);

    if max_elements > limit {
        return Err(LayoutError::CountOverflow {
            field: region.name().to_string(),
            count_field: count_field.to_string(),
            ty: count_type.name().to_string(),
            max_value: limit,
            max_elements,
        });
    }
    Ok(())
}
