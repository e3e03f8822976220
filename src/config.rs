// Tue Jan 13 2026 - Alex

use crate::layout::{AnnotationDefaults, Endian, ModeKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_file: PathBuf,
    pub report_file: Option<PathBuf>,
    pub default_endian: Endian,
    pub default_mode: ModeKind,
    pub derives: Vec<String>,
    pub threads: usize,
    pub fail_fast: bool,
    pub emit_struct_definitions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("layout_gen.rs"),
            report_file: None,
            default_endian: Endian::Little,
            default_mode: ModeKind::Copy,
            derives: vec!["Debug".to_string(), "Clone".to_string(), "PartialEq".to_string()],
            threads: num_cpus::get(),
            fail_fast: false,
            emit_struct_definitions: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_output_file(mut self, output: PathBuf) -> Self {
        self.output_file = output;
        self
    }

    pub fn with_report_file(mut self, report: PathBuf) -> Self {
        self.report_file = Some(report);
        self
    }

    pub fn with_default_endian(mut self, endian: Endian) -> Self {
        self.default_endian = endian;
        self
    }

    pub fn with_default_mode(mut self, mode: ModeKind) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_derives(mut self, derives: Vec<String>) -> Self {
        self.derives = derives;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn annotation_defaults(&self) -> AnnotationDefaults {
        AnnotationDefaults {
            endian: self.default_endian,
            mode: self.default_mode,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be greater than 0".to_string()));
        }
        if let Some(bad) = self
            .derives
            .iter()
            .find(|d| !crate::utils::StringUtils::is_valid_identifier(d))
        {
            return Err(ConfigError::Invalid(format!("derive `{}` is not an identifier", bad)));
        }
        if self.output_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_file must not be empty".to_string()));
        }
        Ok(())
    }
}
