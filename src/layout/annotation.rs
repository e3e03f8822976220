// Tue Jan 13 2026 - Alex

use crate::layout::{Alignment, LayoutError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static PAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)=([\w-]+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Copy,
    #[serde(rename = "zerocopy")]
    ZeroCopy,
}

/// Codec style for a layout. Alignment and allocator exist only for zerocopy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Copy,
    #[serde(rename = "zerocopy")]
    ZeroCopy {
        align: Option<Alignment>,
        allocator: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotationDefaults {
    pub endian: Endian,
    pub mode: ModeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeAnnotation {
    pub size: usize,
    pub endian: Endian,
    #[serde(flatten)]
    pub mode: Mode,
}

impl Endian {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "little" => Some(Self::Little),
            "big" => Some(Self::Big),
            _ => None,
        }
    }

    /// Suffix of the std integer byte-conversion methods (`to_le_bytes`, `from_be_bytes`).
    pub fn bytes_suffix(self) -> &'static str {
        match self {
            Self::Little => "le",
            Self::Big => "be",
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little"),
            Self::Big => write!(f, "big"),
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::ZeroCopy => write!(f, "zerocopy"),
        }
    }
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Copy => ModeKind::Copy,
            Self::ZeroCopy { .. } => ModeKind::ZeroCopy,
        }
    }
}

impl TypeAnnotation {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn zerocopy(mut self) -> Self {
        if !self.is_zerocopy() {
            self.mode = Mode::ZeroCopy {
                align: None,
                allocator: None,
            };
        }
        self
    }

    pub fn is_zerocopy(&self) -> bool {
        matches!(self.mode, Mode::ZeroCopy { .. })
    }

    pub fn align(&self) -> Option<Alignment> {
        match &self.mode {
            Mode::ZeroCopy { align, .. } => *align,
            Mode::Copy => None,
        }
    }

    pub fn allocator(&self) -> Option<&str> {
        match &self.mode {
            Mode::ZeroCopy { allocator, .. } => allocator.as_deref(),
            Mode::Copy => None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        Self::parse_with(text, AnnotationDefaults::default())
    }

    /// Parses `@layout key=value ...`. The `@layout` marker and comment
    /// delimiters are optional; unset keys fall back to `defaults`.
    pub fn parse_with(text: &str, defaults: AnnotationDefaults) -> Result<Self, LayoutError> {
        let body = strip_comment(text);
        let body = body.strip_prefix("@layout").unwrap_or(body);

        let invalid = |reason: String| LayoutError::InvalidAnnotation {
            text: text.trim().to_string(),
            reason,
        };

        let mut size = 0usize;
        let mut endian = defaults.endian;
        let mut mode = defaults.mode;
        let mut align = None;
        let mut allocator = None;

        for token in body.split_whitespace() {
            let caps = PAIR
                .captures(token)
                .ok_or_else(|| invalid(format!("expected key=value, got `{}`", token)))?;
            let value = &caps[2];

            match &caps[1] {
                "size" => {
                    let parsed: i64 = value
                        .parse()
                        .map_err(|_| invalid(format!("invalid size: {}", value)))?;
                    if parsed <= 0 {
                        return Err(invalid(format!("size must be positive, got: {}", parsed)));
                    }
                    size = parsed as usize;
                }
                "endian" => {
                    endian = Endian::parse(value).ok_or_else(|| {
                        invalid(format!("endian must be 'little' or 'big', got: {}", value))
                    })?;
                }
                "mode" => {
                    mode = match value {
                        "copy" => ModeKind::Copy,
                        "zerocopy" => ModeKind::ZeroCopy,
                        _ => {
                            return Err(invalid(format!(
                                "mode must be 'copy' or 'zerocopy', got: {}",
                                value
                            )))
                        }
                    };
                }
                "align" => {
                    let parsed: usize = value
                        .parse()
                        .map_err(|_| invalid(format!("invalid align value: {}", value)))?;
                    align = Some(
                        Alignment::new(parsed)
                            .map_err(|_| invalid(format!("align must be a power of 2, got: {}", value)))?,
                    );
                }
                "allocator" => allocator = Some(value.to_string()),
                other => return Err(invalid(format!("unknown parameter: {}", other))),
            }
        }

        let mode = match mode {
            ModeKind::ZeroCopy => Mode::ZeroCopy { align, allocator },
            ModeKind::Copy if align.is_some() || allocator.is_some() => {
                return Err(invalid("align and allocator require mode=zerocopy".to_string()))
            }
            ModeKind::Copy => Mode::Copy,
        };

        Ok(Self { size, endian, mode })
    }
}

fn strip_comment(text: &str) -> &str {
    let line = text.trim();
    if let Some(rest) = line.strip_prefix("//") {
        return rest.trim();
    }
    if let Some(inner) = line.strip_prefix("/*").and_then(|l| l.strip_suffix("*/")) {
        return inner.trim();
    }
    line
}
