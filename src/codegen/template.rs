// Tue Jan 13 2026 - Alex

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Template syntax error: {0}")]
    SyntaxError(String),
    #[error("Render error: {0}")]
    RenderError(String),
}

/// Minimal `{{var}}` templating with line-level `{{#if var}}` /
/// `{{#unless var}}` blocks closed by `{{#endif}}`. Block tags must sit on
/// their own line; that line is dropped from the output.
pub struct TemplateEngine {
    templates: HashMap<String, String>,
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub fn load_template(&mut self, name: &str, template: &str) {
        self.templates.insert(name.to_string(), template.to_string());
    }

    pub fn set_variable(&mut self, name: &str, value: impl ToString) {
        self.variables.insert(name.to_string(), value.to_string());
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn render(&self, template_name: &str) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| TemplateError::TemplateNotFound(template_name.to_string()))?;

        self.render_string(template)
    }

    pub fn render_string(&self, template: &str) -> Result<String, TemplateError> {
        let kept = self.process_conditionals(template)?;
        self.substitute(&kept)
    }

    fn process_conditionals(&self, input: &str) -> Result<String, TemplateError> {
        let mut result = String::with_capacity(input.len());
        let mut stack: Vec<bool> = Vec::new();

        for line in input.split_inclusive('\n') {
            let tag = line.trim();
            if let Some(condition) = block_tag(tag, "#if ") {
                let active = stack.last().copied().unwrap_or(true);
                stack.push(active && self.evaluate_condition(condition));
                continue;
            }
            if let Some(condition) = block_tag(tag, "#unless ") {
                let active = stack.last().copied().unwrap_or(true);
                stack.push(active && !self.evaluate_condition(condition));
                continue;
            }
            if tag == "{{#endif}}" {
                stack
                    .pop()
                    .ok_or_else(|| TemplateError::SyntaxError("#endif without #if".to_string()))?;
                continue;
            }
            if tag.contains("{{#") {
                return Err(TemplateError::SyntaxError(format!("Block tag must be on its own line: {}", tag)));
            }
            if stack.last().copied().unwrap_or(true) {
                result.push_str(line);
            }
        }

        if !stack.is_empty() {
            return Err(TemplateError::SyntaxError("Missing #endif".to_string()));
        }
        Ok(result)
    }

    /// Single pass, so substituted values are never re-scanned.
    fn substitute(&self, input: &str) -> Result<String, TemplateError> {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| TemplateError::SyntaxError("Unclosed placeholder".to_string()))?;
            let key = after[..close].trim();
            let value = self
                .variables
                .get(key)
                .ok_or_else(|| TemplateError::RenderError(format!("Unresolved variable: {}", key)))?;
            result.push_str(value);
            rest = &after[close + 2..];
        }
        result.push_str(rest);

        Ok(result)
    }

    fn evaluate_condition(&self, condition: &str) -> bool {
        let parts: Vec<&str> = condition.split_whitespace().collect();

        if parts.len() == 1 {
            return self
                .variables
                .get(parts[0])
                .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
                .unwrap_or(false);
        }

        if parts.len() == 3 {
            let left = self.variables.get(parts[0]).map(|s| s.as_str()).unwrap_or(parts[0]);
            let right = self.variables.get(parts[2]).map(|s| s.as_str()).unwrap_or(parts[2]);
            return match parts[1] {
                "==" => left == right,
                "!=" => left != right,
                _ => false,
            };
        }

        false
    }

    pub fn get_built_in_templates() -> HashMap<String, String> {
        let mut templates = HashMap::new();
        templates.insert("file_header".to_string(), FILE_HEADER.to_string());
        templates.insert("codec_error".to_string(), CODEC_ERROR.to_string());
        templates.insert("zerocopy_core".to_string(), ZEROCOPY_CORE.to_string());
        templates
    }

    pub fn load_built_in_templates(&mut self) {
        for (name, content) in Self::get_built_in_templates() {
            self.load_template(&name, &content);
        }
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn block_tag<'a>(tag: &'a str, keyword: &str) -> Option<&'a str> {
    tag.strip_prefix("{{")?.strip_suffix("}}")?.strip_prefix(keyword).map(str::trim)
}

const FILE_HEADER: &str = r#"// Code generated by binlayout {{version}}. DO NOT EDIT.
{{#if source}}
// Source: {{source}}
{{#endif}}

#![allow(dead_code)]
#![allow(clippy::all)]
"#;

const CODEC_ERROR: &str = r#"#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    BufferSize { expected: usize, actual: usize },
    CountMismatch { field: &'static str, count: usize, len: usize },
    RegionOverflow { field: &'static str, needed: usize, capacity: usize },
    Overlap { first: &'static str, second: &'static str },
    IndirectOutOfRange { field: &'static str, index: usize, offset: usize, size: usize },
    IndexOutOfRange { field: &'static str, index: usize, len: usize },
    ArrayLength { field: &'static str, expected: usize, actual: usize },
    OffsetOverflow { field: &'static str, value: usize },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferSize { expected, actual } => {
                write!(f, "buffer is {} bytes, need at least {}", actual, expected)
            }
            Self::CountMismatch { field, count, len } => {
                write!(f, "{}: count field says {} but {} element(s) present", field, count, len)
            }
            Self::RegionOverflow { field, needed, capacity } => {
                write!(f, "{}: needs {} bytes but region holds {}", field, needed, capacity)
            }
            Self::Overlap { first, second } => write!(f, "{} and {} overlap", first, second),
            Self::IndirectOutOfRange { field, index, offset, size } => {
                write!(f, "{}[{}]: [{}, +{}) lies outside its region", field, index, offset, size)
            }
            Self::IndexOutOfRange { field, index, len } => {
                write!(f, "{}: index {} out of range for length {}", field, index, len)
            }
            Self::ArrayLength { field, expected, actual } => {
                write!(f, "{}: expected {} element(s), got {}", field, expected, actual)
            }
            Self::OffsetOverflow { field, value } => {
                write!(f, "{}: {} does not fit the offset or size member", field, value)
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[inline]
fn read_array<const N: usize>(buf: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[at..at + N]);
    out
}

#[inline]
fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < a.1 && b.0 < b.1 && a.0 < b.1 && b.0 < a.1
}
"#;

const ZEROCOPY_CORE: &str = r#"/// `{{name}}` over {{size}} bytes ({{endian}}-endian), accessed in place.
pub struct {{name}} {
    backing: Vec<u8>,
    start: usize,
}

impl {{name}} {
    pub const SIZE: usize = {{size}};
    pub const ALIGN: usize = {{align}};
    pub const REQUIRED: usize = {{required}};

    pub fn new() -> Self {
{{#if allocator}}
        let backing: Vec<u8> = {{allocator}}(Self::REQUIRED);
        if backing.len() < Self::REQUIRED {
            panic!(
                "{{name}}: allocator returned {} bytes, need {}",
                backing.len(),
                Self::REQUIRED
            );
        }
{{#endif}}
{{#unless allocator}}
        let backing = vec![0u8; Self::REQUIRED];
{{#endif}}
{{#if aligned}}
        let start = backing.as_ptr().align_offset(Self::ALIGN);
{{#endif}}
{{#unless aligned}}
        let start = 0;
{{#endif}}
        Self { backing, start }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.backing[self.start..self.start + Self::SIZE]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let start = self.start;
        &mut self.backing[start..start + Self::SIZE]
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < Self::SIZE {
            return Err(CodecError::BufferSize { expected: Self::SIZE, actual: buf.len() });
        }
        let mut value = Self::new();
        value.as_bytes_mut().copy_from_slice(&buf[..Self::SIZE]);
        Ok(value)
    }

    pub fn encode_into(&self, buf: &mut [u8]) -> Result<(), CodecError> {
        if buf.len() < Self::SIZE {
            return Err(CodecError::BufferSize { expected: Self::SIZE, actual: buf.len() });
        }
        buf[..Self::SIZE].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.as_bytes().to_vec())
    }

    pub fn load_from<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut value = Self::new();
        reader.read_exact(value.as_bytes_mut())?;
        Ok(value)
    }

    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}

impl Clone for {{name}} {
    fn clone(&self) -> Self {
        let mut value = Self::new();
        value.as_bytes_mut().copy_from_slice(self.as_bytes());
        value
    }
}

impl PartialEq for {{name}} {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::fmt::Debug for {{name}} {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("{{name}}").field("size", &Self::SIZE).finish_non_exhaustive()
    }
}

impl Default for {{name}} {
    fn default() -> Self {
        Self::new()
    }
}
"#;
