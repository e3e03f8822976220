// Tue Jan 13 2026 - Alex

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

pub struct JsonSerializer {
    pretty_print: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self { pretty_print: true }
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String, JsonError> {
        let result = if self.pretty_print {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        result.map_err(|e| JsonError::SerializationError(e.to_string()))
    }

    pub fn serialize_to_file<T: Serialize, P: AsRef<Path>>(&self, value: &T, path: P) -> Result<(), JsonError> {
        let json_str = self.serialize(value)?;

        let file = File::create(path.as_ref()).map_err(|e| JsonError::IoError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(json_str.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| JsonError::IoError(e.to_string()))?;

        Ok(())
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}
