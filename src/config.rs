//! Session configuration.
//!
//! ```yaml
//! max_macro_depth: 64
//! max_nesting_depth: 256
//! source_name: main.lisp
//! ```

use crate::codegen::MAX_NESTING_DEPTH;
use crate::macros::MAX_MACRO_RECURSION_DEPTH;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_NAME: &str = "<input>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Nested macro expansions allowed before a call is reported as runaway.
    pub max_macro_depth: usize,
    /// Depth of nested forms a single top-level form may reach.
    pub max_nesting_depth: usize,
    /// Name diagnostics show for compiled text.
    pub source_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_macro_depth: MAX_MACRO_RECURSION_DEPTH,
            max_nesting_depth: MAX_NESTING_DEPTH,
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    #[error("could not read config file `{}`", path.display())]
    #[diagnostic(code(lisp2js::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    #[diagnostic(
        code(lisp2js::config::parse),
        help("known keys are `max_macro_depth`, `max_nesting_depth` and `source_name`")
    )]
    Parse(#[from] serde_yaml::Error),
}

impl SessionConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        log::debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = SessionConfig::from_yaml_str("max_macro_depth: 8").unwrap();
        assert_eq!(config.max_macro_depth, 8);
        assert_eq!(config.source_name, DEFAULT_SOURCE_NAME);
        assert_eq!(config.max_nesting_depth, MAX_NESTING_DEPTH);
        assert_eq!(SessionConfig::from_yaml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = SessionConfig::from_yaml_str("max_macro_depth: [1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = SessionConfig::load("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
