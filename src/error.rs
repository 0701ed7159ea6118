//! Configuration error types.
//!
//! Per-tick hook operations never fail: rejected fires, pulls and releases are
//! guarded no-ops reported through outcome values and events. The only
//! fallible surface is loading and validating configuration, which uses
//! [`ConfigError`].

use std::fmt;

/// Error produced while loading or validating a grapple configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for the target type.
    Parse(toml::de::Error),

    /// A parameter is outside its allowed range.
    OutOfRange {
        /// Name of the parameter.
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read grapple config '{}': {}", path, source)
            }
            ConfigError::Parse(err) => write!(f, "failed to parse grapple config: {}", err),
            ConfigError::OutOfRange {
                name,
                value,
                expected,
            } => write!(
                f,
                "grapple parameter '{}' = {} is outside allowed range {}",
                name, value, expected
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::OutOfRange { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Convenience alias: a `Result` using [`ConfigError`] as the error type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Returns an error unless `value > 0`.
pub(crate) fn require_positive(name: &'static str, value: f32) -> ConfigResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value >= 0`.
pub(crate) fn require_non_negative(name: &'static str, value: f32) -> ConfigResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected: "[0.0, ∞)",
        })
    }
}
