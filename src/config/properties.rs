//! Properties file loading
//!
//! Format: `key=value` or `key: value` per line, `#`/`!` comments, and a
//! trailing backslash continues a value on the next line.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Key/value store loaded from a properties file
#[derive(Clone, Debug, Default)]
pub struct Properties {
    values: HashMap<String, String>,
    source: PathBuf,
}

impl Properties {
    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::parse(&text, path)
    }

    /// Load `primary`, or `fallback` when `primary` does not exist
    pub fn load_with_fallback(primary: &Path, fallback: &Path) -> Result<Self, ConfigError> {
        match Self::load(primary) {
            Err(ConfigError::NotFound(_)) if primary != fallback => {
                tracing::debug!(
                    primary = %primary.display(),
                    fallback = %fallback.display(),
                    "Primary properties file missing, using fallback"
                );
                Self::load(fallback)
            }
            other => other,
        }
    }

    /// Parse properties text; `source` is kept for error messages
    pub fn parse(text: &str, source: &Path) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let mut lines = text.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let mut logical = raw.trim_start().to_string();
            if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
                continue;
            }

            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let Some(sep) = logical.find(['=', ':']) else {
                return Err(malformed(source, idx, raw));
            };
            let key = logical[..sep].trim();
            if key.is_empty() {
                return Err(malformed(source, idx, raw));
            }
            let value = logical[sep + 1..].trim();
            values.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            values,
            source: source.to_path_buf(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Required value; missing and empty values are both errors
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                key: key.to_string(),
                path: self.source.clone(),
            })
    }

    /// File the values were read from
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn malformed(source: &Path, idx: usize, raw: &str) -> ConfigError {
    ConfigError::MalformedLine {
        path: source.to_path_buf(),
        line: idx + 1,
        content: raw.to_string(),
    }
}
