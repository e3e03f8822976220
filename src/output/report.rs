// Tue Jan 13 2026 - Alex

use crate::layout::Direction;
use crate::output::{LayoutReport, RegionReport, SchemaReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Markdown,
}

pub struct ReportGenerator {
    format: ReportFormat,
    include_errors: bool,
}

const HEADERS: [&str; 6] = ["FIELD", "KIND", "DIR", "START", "BOUNDARY", "ELEMENT"];

impl ReportGenerator {
    pub fn new(format: ReportFormat) -> Self {
        Self {
            format,
            include_errors: true,
        }
    }

    pub fn with_errors(mut self, include: bool) -> Self {
        self.include_errors = include;
        self
    }

    pub fn generate(&self, report: &SchemaReport) -> String {
        let mut out = String::new();
        for (i, layout) in report.layouts.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.generate_layout(layout));
        }
        out
    }

    pub fn generate_layout(&self, layout: &LayoutReport) -> String {
        match self.format {
            ReportFormat::Text => self.generate_text(layout),
            ReportFormat::Markdown => self.generate_markdown(layout),
        }
    }

    fn generate_text(&self, layout: &LayoutReport) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "{}  {} bytes  {}  {}-endian\n",
            layout.name, layout.buffer_size, layout.mode, layout.endian
        ));

        let rows = rows(layout);
        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: &[String]| {
            let line = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ");
            format!("  {}\n", line.trim_end())
        };

        let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        report.push_str(&render(headers.as_slice()));
        for row in &rows {
            report.push_str(&render(row.as_slice()));
        }

        for indirect in &layout.indirect {
            report.push_str(&format!(
                "  {} -> {}[].{{{}, {}}} in {}\n",
                indirect.field, indirect.from, indirect.offset_member, indirect.size_member, indirect.region
            ));
        }

        if self.include_errors && !layout.errors.is_empty() {
            report.push_str("  errors:\n");
            for error in &layout.errors {
                report.push_str(&format!("    - [{}] {}\n", error.kind, error.message));
            }
        }

        report
    }

    fn generate_markdown(&self, layout: &LayoutReport) -> String {
        let mut md = String::new();
        md.push_str(&format!("## {}\n\n", layout.name));
        md.push_str(&format!(
            "{} bytes, {} mode, {}-endian\n\n",
            layout.buffer_size, layout.mode, layout.endian
        ));
        md.push_str(&format!("| {} |\n", HEADERS.join(" | ")));
        md.push_str(&format!("|{}\n", "---|".repeat(HEADERS.len())));
        for row in rows(layout) {
            md.push_str(&format!("| {} |\n", row.join(" | ")));
        }

        if !layout.indirect.is_empty() {
            md.push('\n');
            for indirect in &layout.indirect {
                md.push_str(&format!(
                    "- `{}` reads `{}` through `{}.{}` / `{}.{}`\n",
                    indirect.field,
                    indirect.region,
                    indirect.from,
                    indirect.offset_member,
                    indirect.from,
                    indirect.size_member
                ));
            }
        }

        if self.include_errors && !layout.errors.is_empty() {
            md.push_str("\n### Errors\n\n");
            for error in &layout.errors {
                md.push_str(&format!("- **{}**: {}\n", error.kind, error.message));
            }
        }

        md
    }
}

fn rows(layout: &LayoutReport) -> Vec<Vec<String>> {
    layout.regions.iter().map(row).collect()
}

fn row(region: &RegionReport) -> Vec<String> {
    let offset = |v: Option<usize>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
    let element = match (&region.element_type, region.element_size) {
        (Some(ty), Some(size)) => {
            let count = region
                .count_field
                .as_deref()
                .map(|c| format!(" count={}", c))
                .unwrap_or_default();
            format!("{} x{}{}", ty, size, count)
        }
        _ => String::new(),
    };
    vec![
        region.field.clone(),
        format!("{:?}", region.kind).to_lowercase(),
        arrow(region.direction).to_string(),
        offset(region.start),
        offset(region.boundary),
        element,
    ]
}

fn arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Fixed => "@",
        Direction::StartEnd => "->",
        Direction::EndStart => "<-",
    }
}
