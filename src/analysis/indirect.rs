// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::layout::{FieldLayout, IndirectSlice, LayoutError, TypeLayout, TypeRef, TypeRegistry};
use serde::Serialize;

/// An indirect `[][]byte` field resolved to the regions it reads through.
/// Indices are field positions within the owning layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndirectRef {
    pub field: usize,
    pub from: usize,
    pub region: usize,
    pub offset_member: String,
    pub size_member: String,
}

pub fn resolve_indirect_slices(
    regions: &[Region],
    layout: &TypeLayout,
    registry: &TypeRegistry,
) -> (Vec<IndirectRef>, Vec<LayoutError>) {
    let mut resolved = Vec::new();
    let mut errors = Vec::new();

    for (index, field) in layout.fields().enumerate() {
        let FieldLayout::Indirect(slice) = field.layout() else {
            continue;
        };
        match resolve_one(index, field.name(), field.ty(), slice, regions, layout, registry) {
            Ok(indirect) => resolved.push(indirect),
            Err(e) => errors.push(e),
        }
    }

    (resolved, errors)
}

fn resolve_one(
    index: usize,
    name: &str,
    ty: &TypeRef,
    slice: &IndirectSlice,
    regions: &[Region],
    layout: &TypeLayout,
    registry: &TypeRegistry,
) -> Result<IndirectRef, LayoutError> {
    let invalid = |reason: String| LayoutError::InvalidIndirectSlice {
        field: name.to_string(),
        reason,
    };

    let is_bytes_of_bytes = match registry.resolve_deep(ty) {
        Ok(TypeRef::Slice(inner)) => matches!(inner.as_ref(), TypeRef::Slice(b) if b.is_byte()),
        _ => false,
    };
    if !is_bytes_of_bytes {
        return Err(invalid(format!("type must be [][]byte, got {}", ty)));
    }

    let region_for = |target: &str| {
        let position = layout
            .index_of(target)
            .ok_or_else(|| invalid(format!("field {} not found", target)))?;
        regions
            .iter()
            .find(|r| r.field_index() == position)
            .map(|r| (position, r))
            .ok_or_else(|| invalid(format!("field {} is not a region", target)))
    };

    let (from, source) = region_for(&slice.from)?;
    if !source.is_dynamic() || source.is_byte_slice() {
        return Err(invalid(format!("from={} must be a slice of structs", slice.from)));
    }
    if source.count_field().is_none() {
        return Err(invalid(format!("from={} must declare count=", slice.from)));
    }

    let (region, data) = region_for(&slice.region)?;
    if !data.is_dynamic() || !data.is_byte_slice() {
        return Err(invalid(format!("region={} must be a []byte region", slice.region)));
    }

    if let Some(element) = source.element_type().and_then(TypeRef::as_named) {
        for member in [&slice.offset_field, &slice.size_field] {
            check_member(element, member, registry).map_err(invalid)?;
        }
    }

    Ok(IndirectRef {
        field: index,
        from,
        region,
        offset_member: slice.offset_field.clone(),
        size_member: slice.size_field.clone(),
    })
}

fn check_member(element: &str, member: &str, registry: &TypeRegistry) -> Result<(), String> {
    let element = match registry.resolve(&TypeRef::named(element)) {
        Ok(TypeRef::Named(resolved)) => resolved,
        _ => return Ok(()),
    };
    let Some(members) = registry.members(&element) else {
        log::debug!("No member list for {}, skipping check of {}", element, member);
        return Ok(());
    };
    let found = members
        .iter()
        .find(|m| m.name() == member)
        .ok_or_else(|| format!("{} has no field {}", element, member))?;
    match registry.resolve(found.ty()) {
        Ok(TypeRef::Primitive(p)) if p.is_integer() => Ok(()),
        _ => Err(format!("{}.{} must be an integer, got {}", element, member, found.ty())),
    }
}
