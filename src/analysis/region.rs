// Tue Jan 13 2026 - Alex

use crate::layout::{Direction, Field, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Fixed,
    Dynamic,
}

/// One field placed in the buffer.
///
/// `start` is where the field begins (for `end-start`, the high end it grows
/// down from) and `boundary` is where it may grow to. Both stay `None` until
/// boundary resolution assigns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub(crate) kind: RegionKind,
    pub(crate) start: Option<usize>,
    pub(crate) boundary: Option<usize>,
    pub(crate) direction: Direction,
    pub(crate) anchored: bool,
    pub(crate) field: Field,
    pub(crate) field_index: usize,
    pub(crate) element_size: usize,
    pub(crate) element_type: Option<TypeRef>,
}

impl Region {
    pub(crate) fn fixed(field: &Field, field_index: usize, offset: usize, size: usize) -> Self {
        Self {
            kind: RegionKind::Fixed,
            start: Some(offset),
            boundary: Some(offset + size),
            direction: Direction::Fixed,
            anchored: true,
            field: field.clone(),
            field_index,
            element_size: 0,
            element_type: None,
        }
    }

    pub(crate) fn dynamic(
        field: &Field,
        field_index: usize,
        direction: Direction,
        anchor: Option<usize>,
        element_type: TypeRef,
        element_size: usize,
    ) -> Self {
        Self {
            kind: RegionKind::Dynamic,
            start: anchor,
            boundary: None,
            direction,
            anchored: anchor.is_some(),
            field: field.clone(),
            field_index,
            element_size,
            element_type: Some(element_type),
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn is_fixed(&self) -> bool {
        self.kind == RegionKind::Fixed
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == RegionKind::Dynamic
    }

    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn boundary(&self) -> Option<usize> {
        self.boundary
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Fixed regions and dynamic regions with an explicit `@N` start.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn element_type(&self) -> Option<&TypeRef> {
        self.element_type.as_ref()
    }

    pub fn is_byte_slice(&self) -> bool {
        self.element_type.as_ref().map(TypeRef::is_byte).unwrap_or(false)
    }

    pub fn count_field(&self) -> Option<&str> {
        self.field.layout().count_field()
    }

    /// Occupied or claimable interval as `[low, high)`, once both ends are known.
    /// An inverted interval is returned as-is so callers can flag it.
    pub fn span(&self) -> Option<(usize, usize)> {
        let (start, boundary) = (self.start?, self.boundary?);
        Some(match self.direction {
            Direction::Fixed | Direction::StartEnd => (start, boundary),
            Direction::EndStart => (boundary, start),
        })
    }

    /// Bytes available to the region; `None` when unresolved or inverted.
    pub fn capacity(&self) -> Option<usize> {
        let (low, high) = self.span()?;
        high.checked_sub(low)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<usize>| v.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
        write!(
            f,
            "{} {} start={} boundary={}",
            self.name(),
            self.direction,
            show(self.start),
            show(self.boundary)
        )
    }
}
