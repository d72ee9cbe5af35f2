//! Engine configuration
//!
//! [`EngineConfig`] carries the tunables of the engine. It is built in code
//! with `with_*` methods or loaded from TOML:
//!
//! ```toml
//! max_render_depth = 16
//! adapter_timeout_ms = 5000
//! store_dir = "pages"
//! log_level = "debug"
//!
//! [breakpoints]
//! medium = "sm:"
//! large = "xl:"
//! ```
//!
//! The block registry is not configuration; it is built in code at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pagekit_schema::BreakpointPrefixes;
use serde::{Deserialize, Serialize};

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Not valid TOML for this shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Selector prefix per breakpoint
    pub breakpoints: BreakpointPrefixes,

    /// Deepest zone nesting the renderer descends into
    pub max_render_depth: usize,

    /// Timeout for one adapter call in milliseconds
    pub adapter_timeout_ms: u64,

    /// Directory of the file-backed store
    pub store_dir: Option<PathBuf>,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl EngineConfig {
    /// Create configuration with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set breakpoint prefixes
    #[inline]
    #[must_use]
    pub fn with_breakpoints(mut self, breakpoints: BreakpointPrefixes) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    /// Set render depth limit
    #[inline]
    #[must_use]
    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth;
        self
    }

    /// Set adapter timeout
    #[inline]
    #[must_use]
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set store directory
    #[inline]
    #[must_use]
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// Set default log level
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Adapter timeout as a duration
    #[inline]
    #[must_use]
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// As [`EngineConfig::from_toml_str`], plus `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_render_depth == 0 {
            return Err(ConfigError::Invalid("max_render_depth must be at least 1".into()));
        }
        if self.adapter_timeout_ms == 0 {
            return Err(ConfigError::Invalid("adapter_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoints: BreakpointPrefixes::default(),
            max_render_depth: 32,
            adapter_timeout_ms: 15_000,
            store_dir: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.breakpoints.medium, "md:");
        assert_eq!(config.max_render_depth, 32);
        assert_eq!(config.adapter_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            adapter_timeout_ms = 250
            [breakpoints]
            large = "xl:"
            "#,
        )
        .unwrap();
        assert_eq!(config.adapter_timeout_ms, 250);
        assert_eq!(config.breakpoints.large, "xl:");
        assert_eq!(config.breakpoints.medium, "md:");
        assert_eq!(config.max_render_depth, 32);
    }

    #[test]
    fn zero_depth_is_invalid() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_render_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_render_depth = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagekit.toml");
        std::fs::write(&path, "store_dir = \"pages\"\nlog_level = \"debug\"\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.store_dir, Some(PathBuf::from("pages")));
        assert_eq!(config.log_level, "debug");
        assert!(EngineConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn builder_methods() {
        let config = EngineConfig::new()
            .with_max_render_depth(4)
            .with_adapter_timeout(Duration::from_millis(20))
            .with_store_dir("/tmp/pages");
        assert_eq!(config.max_render_depth, 4);
        assert_eq!(config.adapter_timeout_ms, 20);
    }
}
