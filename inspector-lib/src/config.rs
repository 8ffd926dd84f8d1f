//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, merging
//! configurations with proper precedence rules, and reading `INSPECTOR_*`
//! environment variables.

use crate::catalogue::{PlatformTemplate, USERNAME_PLACEHOLDER};
use crate::error::ProbeError;
use crate::types::{MatchRule, MAX_CONCURRENCY};
use crate::utils::parse_duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can create
/// to set default values and add platform groups.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// User-defined platform groups, keyed by group id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_platforms: Option<HashMap<String, Vec<PlatformTemplate>>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default platform groups to search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,

    /// Default request timeout (as string, e.g., "5s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// User-Agent header for probe requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration, or an error if the file is
    /// missing, unreadable, malformed or invalid.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ProbeError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ProbeError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ProbeError::config(format!(
                "Failed to parse TOML configuration '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = normalize_group_ids(config)?;
        self.validate_config(&config)?;
        debug!(path = %path.display(), "loaded config file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are skipped with a warning; a broken global
    /// file should not prevent a search.
    pub fn discover_and_load(&self) -> FileConfig {
        let candidates = [
            // 1. XDG config (lowest precedence)
            self.get_xdg_config_path(),
            // 2. Global config
            self.get_global_config_path(),
            // 3. Local config (highest precedence)
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(error = %e, "ignoring config file"),
            }
        }

        if loaded_files.len() > 1 {
            debug!(
                files = ?loaded_files,
                "multiple config files merged, later files take precedence"
            );
        }

        merged_config
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./inspector.toml", "./.inspector.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".inspector.toml", "inspector.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("inspector").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.platforms.is_some() {
                        lower_defaults.platforms = higher_defaults.platforms;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.user_agent.is_some() {
                        lower_defaults.user_agent = higher_defaults.user_agent;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            custom_platforms: match (lower.custom_platforms, higher.custom_platforms) {
                (Some(mut lower_groups), Some(higher_groups)) => {
                    // Higher precedence wins for groups defined in both
                    lower_groups.extend(higher_groups);
                    Some(lower_groups)
                }
                (lower_groups, higher_groups) => higher_groups.or(lower_groups),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ProbeError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(ProbeError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_duration(timeout_str).is_none() {
                    return Err(ProbeError::config(format!(
                        "Invalid timeout format '{}'. Use format like '500ms', '5s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(user_agent) = &defaults.user_agent {
                if user_agent.trim().is_empty() {
                    return Err(ProbeError::config("User agent cannot be empty"));
                }
            }
        }

        if let Some(groups) = &config.custom_platforms {
            for (id, platforms) in groups {
                validate_custom_group(id, platforms)?;
            }
        }

        Ok(())
    }
}

/// Trim and lowercase custom group ids so files merge on the same key.
fn normalize_group_ids(mut config: FileConfig) -> Result<FileConfig, ProbeError> {
    if let Some(groups) = config.custom_platforms.take() {
        let mut normalized = HashMap::with_capacity(groups.len());
        for (id, platforms) in groups {
            let key = id.trim().to_lowercase();
            if normalized.insert(key.clone(), platforms).is_some() {
                return Err(ProbeError::config(format!(
                    "Custom platform group '{}' is defined more than once",
                    key
                )));
            }
        }
        config.custom_platforms = Some(normalized);
    }
    Ok(config)
}

fn validate_custom_group(id: &str, platforms: &[PlatformTemplate]) -> Result<(), ProbeError> {
    if id.trim().is_empty() {
        return Err(ProbeError::config("Custom platform group names cannot be empty"));
    }

    if platforms.is_empty() {
        return Err(ProbeError::config(format!(
            "Custom platform group '{}' cannot be empty",
            id
        )));
    }

    for platform in platforms {
        if platform.name.trim().is_empty() {
            return Err(ProbeError::config(format!(
                "Platform in group '{}' has an empty name",
                id
            )));
        }

        if !platform.url.starts_with("http://") && !platform.url.starts_with("https://") {
            return Err(ProbeError::config(format!(
                "Platform '{}' in group '{}' must use an http(s) URL",
                platform.name, id
            )));
        }

        if !platform.url.contains(USERNAME_PLACEHOLDER) {
            return Err(ProbeError::config(format!(
                "Platform '{}' in group '{}' has no {} placeholder in its URL",
                platform.name, id, USERNAME_PLACEHOLDER
            )));
        }

        if let MatchRule::StatusInRange { min, max } = platform.rule {
            if min > max {
                return Err(ProbeError::config(format!(
                    "Platform '{}' in group '{}' has an empty status range {}-{}",
                    platform.name, id, min, max
                )));
            }
        }
    }

    Ok(())
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via INSPECTOR_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub platforms: Option<Vec<String>>,
    pub timeout: Option<String>,
    pub user_agent: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from any variable lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // INSPECTOR_CONCURRENCY - concurrent probes
    if let Some(val) = lookup("INSPECTOR_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= MAX_CONCURRENCY => {
                debug!(concurrency, "using INSPECTOR_CONCURRENCY");
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!(
                value = %val,
                "invalid INSPECTOR_CONCURRENCY, must be 1-{}", MAX_CONCURRENCY
            ),
        }
    }

    // INSPECTOR_PLATFORMS - comma-separated group ids
    if let Some(val) = lookup("INSPECTOR_PLATFORMS") {
        let platforms: Vec<String> = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if platforms.is_empty() {
            warn!(value = %val, "invalid INSPECTOR_PLATFORMS, no group ids found");
        } else {
            debug!(platforms = %val, "using INSPECTOR_PLATFORMS");
            env_config.platforms = Some(platforms);
        }
    }

    // INSPECTOR_TIMEOUT - per-request timeout
    if let Some(val) = lookup("INSPECTOR_TIMEOUT") {
        if parse_duration(&val).is_some() {
            debug!(timeout = %val, "using INSPECTOR_TIMEOUT");
            env_config.timeout = Some(val);
        } else {
            warn!(
                value = %val,
                "invalid INSPECTOR_TIMEOUT, use format like '500ms', '5s', '2m'"
            );
        }
    }

    // INSPECTOR_USER_AGENT - User-Agent header
    if let Some(val) = lookup("INSPECTOR_USER_AGENT") {
        if !val.trim().is_empty() {
            env_config.user_agent = Some(val);
        }
    }

    // INSPECTOR_CONFIG - explicit config file
    if let Some(val) = lookup("INSPECTOR_CONFIG") {
        if !val.trim().is_empty() {
            env_config.config = Some(val);
        }
    }

    env_config
}
