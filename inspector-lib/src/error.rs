//! Error handling for probe operations.
//!
//! This module defines the error type shared by the catalogue, the engine and
//! the configuration layer. Configuration errors are fatal and surface before
//! any request is made; per-target errors stay local to one probe.

use std::fmt;
use std::time::Duration;

/// Main error type for inspector operations.
#[derive(Debug, Clone)]
pub enum ProbeError {
    /// No platform group was selected
    NoPlatformSelected,

    /// A platform group identifier that the catalogue does not know
    UnknownPlatform {
        platform: String,
        known: Vec<String>,
    },

    /// Username rejected before building the catalogue
    InvalidUsername {
        username: String,
        reason: String,
    },

    /// Configuration errors (invalid settings, bad config file, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration files
    FileError {
        path: String,
        message: String,
    },

    /// Transport-level failure for a single target (DNS, refused, reset, ...)
    NetworkError {
        url: String,
        message: String,
    },

    /// A single target's request exceeded the request timeout
    Timeout {
        url: String,
        duration: Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl ProbeError {
    /// Create a new unknown platform error.
    pub fn unknown_platform<P: Into<String>>(platform: P, known: Vec<String>) -> Self {
        Self::UnknownPlatform {
            platform: platform.into(),
            known,
        }
    }

    /// Create a new invalid username error.
    pub fn invalid_username<U: Into<String>, R: Into<String>>(username: U, reason: R) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new network error for a target URL.
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::NetworkError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error for a target URL.
    pub fn timeout<U: Into<String>>(url: U, duration: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is detected before probing starts and should abort the run.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::NoPlatformSelected
                | Self::UnknownPlatform { .. }
                | Self::InvalidUsername { .. }
                | Self::ConfigError { .. }
                | Self::FileError { .. }
        )
    }

    /// Short label for per-target diagnostics.
    pub fn brief(&self) -> String {
        match self {
            Self::Timeout { duration, .. } => format!("timeout after {:?}", duration),
            Self::NetworkError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPlatformSelected => {
                write!(f, "No platform selected: please specify at least one platform to search")
            }
            Self::UnknownPlatform { platform, known } => {
                if known.is_empty() {
                    write!(f, "Unknown platform '{}'", platform)
                } else {
                    write!(
                        f,
                        "Unknown platform '{}' (known platforms: {})",
                        platform,
                        known.join(", ")
                    )
                }
            }
            Self::InvalidUsername { username, reason } => {
                write!(f, "Invalid username '{}': {}", username, reason)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::NetworkError { url, message } => {
                write!(f, "Network error for '{}': {}", url, message)
            }
            Self::Timeout { url, duration } => {
                write!(f, "Timeout after {:?} requesting '{}'", duration, url)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
