//! Boundary configuration types

use crate::LogLevel;
use crate::encoding::Encoding;
use crate::error::{MarshalError, MarshalResult};
use serde::{Deserialize, Serialize};

/// Configuration for a boundary context
///
/// Passed as JSON to `nb_context_create`. Every field has a default, so an
/// empty document (or no document at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Encoding of strings exchanged with the host
    #[serde(default)]
    pub encoding: Encoding,

    /// Initial log level of the context's log sink
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on bytes scanned when decoding a string without a length hint
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,

    /// Route panic reports through the log callback
    #[serde(default = "default_install_panic_hook")]
    pub install_panic_hook: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_string_len() -> usize {
    1024 * 1024
}

fn default_install_panic_hook() -> bool {
    true
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            log_level: default_log_level(),
            max_string_len: default_max_string_len(),
            install_panic_hook: default_install_panic_hook(),
        }
    }
}

impl BoundaryConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    ///
    /// Empty input yields the defaults. The result is validated.
    pub fn from_json(bytes: &[u8]) -> MarshalResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field holds a usable value
    pub fn validate(&self) -> MarshalResult<()> {
        if LogLevel::parse(&self.log_level).is_none() {
            return Err(MarshalError::Config(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        if self.max_string_len == 0 {
            return Err(MarshalError::Config(
                "max_string_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed log level, falling back to `Info`
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }

    /// Builder-style encoding override
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}
