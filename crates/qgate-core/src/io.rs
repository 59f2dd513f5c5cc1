//! Whole-file read/write helpers.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{QgateError, Result};

/// Read a required text file.
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(QgateError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| QgateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Outcome of reading an optional JSON artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRead {
    Missing,
    Unparseable(String),
    Parsed(Value),
}

impl JsonRead {
    /// The parsed value, treating missing and unparseable alike.
    pub fn into_value(self) -> Option<Value> {
        match self {
            JsonRead::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

/// Read a JSON file, degrading instead of failing.
pub fn read_json_lenient(path: &Path) -> JsonRead {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return JsonRead::Missing,
    };
    match serde_json::from_str(&raw) {
        Ok(value) => JsonRead::Parsed(value),
        Err(e) => JsonRead::Unparseable(e.to_string()),
    }
}

/// Write a text file, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let write_err = |source| QgateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    fs::write(path, content).map_err(write_err)
}

/// Write `value` as pretty JSON with a trailing newline.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_text(path, &json)
}

/// Append to a text file, creating it when absent.
pub fn append_text(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| QgateError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(content.as_bytes())
        .map_err(|source| QgateError::Write {
            path: path.to_path_buf(),
            source,
        })
}
