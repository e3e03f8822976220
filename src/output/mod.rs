// Tue Jan 13 2026 - Alex

pub mod json;
pub mod report;

pub use json::{JsonError, JsonSerializer};
pub use report::{ReportFormat, ReportGenerator};

use crate::analysis::{AnalyzedLayout, RegionKind};
use crate::layout::{Direction, Endian, LayoutError, ModeKind, TypeLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub tool: String,
    pub version: String,
    pub layouts: Vec<LayoutReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub name: String,
    pub buffer_size: usize,
    pub mode: ModeKind,
    pub endian: Endian,
    pub valid: bool,
    pub regions: Vec<RegionReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indirect: Vec<IndirectReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub field: String,
    pub kind: RegionKind,
    pub direction: Direction,
    pub start: Option<usize>,
    pub boundary: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndirectReport {
    pub field: String,
    pub from: String,
    pub region: String,
    pub offset_member: String,
    pub size_member: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl SchemaReport {
    pub fn new(layouts: Vec<LayoutReport>) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            layouts,
        }
    }

    pub fn valid_count(&self) -> usize {
        self.layouts.iter().filter(|l| l.valid).count()
    }

    pub fn error_count(&self) -> usize {
        self.layouts.iter().map(|l| l.errors.len()).sum()
    }

    pub fn layout(&self, name: &str) -> Option<&LayoutReport> {
        self.layouts.iter().find(|l| l.name == name)
    }
}

impl LayoutReport {
    pub fn new(layout: &TypeLayout, analyzed: &AnalyzedLayout) -> Self {
        let annotation = layout.annotation();
        let name_of = |index: usize| {
            layout
                .field_at(index)
                .map(|f| f.name().to_string())
                .unwrap_or_else(|| format!("#{}", index))
        };

        let regions = analyzed
            .regions()
            .iter()
            .map(|r| RegionReport {
                field: r.name().to_string(),
                kind: r.kind(),
                direction: r.direction(),
                start: r.start(),
                boundary: r.boundary(),
                element_type: r.element_type().map(|t| t.to_string()),
                element_size: r.is_dynamic().then(|| r.element_size()),
                count_field: r.count_field().map(str::to_string),
            })
            .collect();

        let indirect = analyzed
            .indirect()
            .iter()
            .map(|i| IndirectReport {
                field: name_of(i.field),
                from: name_of(i.from),
                region: name_of(i.region),
                offset_member: i.offset_member.clone(),
                size_member: i.size_member.clone(),
            })
            .collect();

        Self {
            name: layout.name().to_string(),
            buffer_size: analyzed.buffer_size(),
            mode: annotation.mode.kind(),
            endian: annotation.endian,
            valid: analyzed.is_valid(),
            regions,
            indirect,
            errors: analyzed.errors().iter().map(ErrorReport::from).collect(),
        }
    }
}

impl From<&LayoutError> for ErrorReport {
    fn from(error: &LayoutError) -> Self {
        Self {
            kind: error.kind().to_string(),
            field: error.field().map(str::to_string),
            message: error.to_string(),
        }
    }
}
