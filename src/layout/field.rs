// Tue Jan 13 2026 - Alex

use crate::layout::{LayoutError, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Fixed,
    StartEnd,
    EndStart,
}

/// Growth direction of a dynamic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Growth {
    StartEnd,
    EndStart,
}

impl From<Growth> for Direction {
    fn from(growth: Growth) -> Self {
        match growth {
            Growth::StartEnd => Direction::StartEnd,
            Growth::EndStart => Direction::EndStart,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::StartEnd => write!(f, "start-end"),
            Self::EndStart => write!(f, "end-start"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectSlice {
    pub from: String,
    pub offset_field: String,
    pub size_field: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLayout {
    Fixed {
        offset: usize,
    },
    Dynamic {
        growth: Growth,
        anchor: Option<usize>,
        count: Option<String>,
    },
    Indirect(IndirectSlice),
}

impl FieldLayout {
    pub fn fixed(offset: usize) -> Self {
        Self::Fixed { offset }
    }

    pub fn start_end() -> Self {
        Self::Dynamic {
            growth: Growth::StartEnd,
            anchor: None,
            count: None,
        }
    }

    pub fn end_start() -> Self {
        Self::Dynamic {
            growth: Growth::EndStart,
            anchor: None,
            count: None,
        }
    }

    pub fn anchored(mut self, at: usize) -> Self {
        if let Self::Dynamic { anchor, .. } = &mut self {
            *anchor = Some(at);
        }
        self
    }

    pub fn with_count(mut self, field: impl Into<String>) -> Self {
        if let Self::Dynamic { count, .. } = &mut self {
            *count = Some(field.into());
        }
        self
    }

    pub fn indirect(from: &str, offset_field: &str, size_field: &str, region: &str) -> Self {
        Self::Indirect(IndirectSlice {
            from: from.to_string(),
            offset_field: offset_field.to_string(),
            size_field: size_field.to_string(),
            region: region.to_string(),
        })
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Fixed { .. } => Some(Direction::Fixed),
            Self::Dynamic { growth, .. } => Some((*growth).into()),
            Self::Indirect(_) => None,
        }
    }

    pub fn count_field(&self) -> Option<&str> {
        match self {
            Self::Dynamic { count, .. } => count.as_deref(),
            _ => None,
        }
    }

    /// Parses a field tag: `@N`, `start-end`, `@N,end-start,count=Len`
    /// or `from=F,offset=O,size=S,region=R`.
    pub fn parse(tag: &str) -> Result<Self, LayoutError> {
        let invalid = |reason: &str| LayoutError::InvalidTag {
            tag: tag.to_string(),
            reason: reason.to_string(),
        };

        let tag_text = tag.trim();
        if tag_text.is_empty() {
            return Err(invalid("empty layout tag"));
        }

        let parts: Vec<&str> = tag_text.split(',').map(str::trim).collect();

        if parts[0].starts_with("from=") {
            return parse_indirect(&parts).map_err(|reason| invalid(&reason));
        }

        let (anchor, rest) = match parts[0].strip_prefix('@') {
            Some(offset) => {
                let offset: usize = offset
                    .parse()
                    .map_err(|_| invalid(&format!("invalid offset: {}", parts[0])))?;
                if parts.len() == 1 {
                    return Ok(Self::fixed(offset));
                }
                (Some(offset), &parts[1..])
            }
            None => (None, &parts[..]),
        };

        let growth = match rest[0] {
            "start-end" => Growth::StartEnd,
            "end-start" => Growth::EndStart,
            other => {
                return Err(invalid(&format!(
                    "invalid direction: {} (expected start-end or end-start)",
                    other
                )))
            }
        };

        let mut count = None;
        for part in &rest[1..] {
            match part.strip_prefix("count=") {
                Some("") => return Err(invalid("count= requires field name")),
                Some(field) => count = Some(field.to_string()),
                None => return Err(invalid(&format!("unknown parameter: {}", part))),
            }
        }

        Ok(Self::Dynamic {
            growth,
            anchor,
            count,
        })
    }
}

fn parse_indirect(parts: &[&str]) -> Result<FieldLayout, String> {
    let (mut from, mut offset, mut size, mut region) = (None, None, None, None);

    for part in parts {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("invalid indirect slice parameter: {}", part))?;
        let slot = match key {
            "from" => &mut from,
            "offset" => &mut offset,
            "size" => &mut size,
            "region" => &mut region,
            other => return Err(format!("unknown indirect slice parameter: {}", other)),
        };
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    match (from, offset, size, region) {
        (Some(from), Some(offset_field), Some(size_field), Some(region)) => {
            Ok(FieldLayout::Indirect(IndirectSlice {
                from,
                offset_field,
                size_field,
                region,
            }))
        }
        _ => Err("indirect slice requires all 4 params: from, offset, size, region".to_string()),
    }
}

impl fmt::Display for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { offset } => write!(f, "@{}", offset),
            Self::Dynamic {
                growth,
                anchor,
                count,
            } => {
                if let Some(at) = anchor {
                    write!(f, "@{},", at)?;
                }
                write!(f, "{}", Direction::from(*growth))?;
                if let Some(count) = count {
                    write!(f, ",count={}", count)?;
                }
                Ok(())
            }
            Self::Indirect(slice) => write!(
                f,
                "from={},offset={},size={},region={}",
                slice.from, slice.offset_field, slice.size_field, slice.region
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ty: TypeRef,
    layout: FieldLayout,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef, layout: FieldLayout) -> Self {
        Self {
            name: name.into(),
            ty,
            layout,
        }
    }

    /// Builds a field from its type notation and tag text.
    pub fn parse(name: &str, notation: &str, tag: &str) -> Result<Self, LayoutError> {
        let ty = TypeRef::parse(notation).map_err(|e| LayoutError::in_field(name, e))?;
        let layout = FieldLayout::parse(tag).map_err(|e| LayoutError::in_field(name, e))?;
        Ok(Self::new(name, ty, layout))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self.layout, FieldLayout::Indirect(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} `{}`", self.name, self.ty, self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed() {
        assert_eq!(FieldLayout::parse("@0").unwrap(), FieldLayout::fixed(0));
        assert_eq!(FieldLayout::parse("@4088").unwrap(), FieldLayout::fixed(4088));
    }

    #[test]
    fn test_parse_directions() {
        assert_eq!(FieldLayout::parse("start-end").unwrap(), FieldLayout::start_end());
        assert_eq!(FieldLayout::parse("end-start").unwrap(), FieldLayout::end_start());
        assert_eq!(
            FieldLayout::parse("@100,end-start,count=NumKeys").unwrap(),
            FieldLayout::end_start().anchored(100).with_count("NumKeys")
        );
        assert_eq!(
            FieldLayout::parse("start-end, count=Header.NumKeys").unwrap(),
            FieldLayout::start_end().with_count("Header.NumKeys")
        );
    }

    #[test]
    fn test_parse_indirect() {
        let layout =
            FieldLayout::parse("from=Elements,offset=KeyOffset,size=KeySize,region=Data").unwrap();
        assert_eq!(
            layout,
            FieldLayout::indirect("Elements", "KeyOffset", "KeySize", "Data")
        );
        assert_eq!(layout.direction(), None);
    }

    #[test]
    fn test_parse_rejects_bad_tags() {
        for tag in [
            "",
            "@x",
            "@-1",
            "sideways",
            "@0,start-end,cnt=Len",
            "start-end,count=",
            "from=Elements,offset=KeyOffset",
            "from=Elements,offset=KeyOffset,size=KeySize,region=Data,extra=1",
        ] {
            let err = FieldLayout::parse(tag).unwrap_err();
            assert_eq!(err.kind(), "invalid_tag", "{}", tag);
        }
    }

    #[test]
    fn test_display_round_trips_tag_text() {
        for tag in ["@16", "start-end", "@8,end-start,count=Len"] {
            assert_eq!(FieldLayout::parse(tag).unwrap().to_string(), tag);
        }
    }

    #[test]
    fn test_field_parse_wraps_errors() {
        let err = Field::parse("Body", "[x]byte", "start-end").unwrap_err();
        assert_eq!(err.field(), Some("Body"));
        assert_eq!(err.kind(), "invalid_type_notation");
    }
}
