//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$HTML2EML_CONFIG` (environment variable)
//! 2. `~/.config/html2eml/config.toml` (Linux/macOS)
//!    `%APPDATA%\html2eml\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Command-line flags take precedence over every value here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Defaults for generated messages.
    pub message: MessageConfig,
    /// Extra sanitization rules.
    pub sanitize: SanitizeConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level when `-v` is not given: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Also append logs to `html2eml.log` in the cache directory.
    pub log_file: bool,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Defaults for generated messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Default `From:` address.
    pub from: Option<String>,
    /// Default `To:` address.
    pub to: Option<String>,
}

/// Extra sanitization rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// CSS selectors of elements to drop in addition to the built-in list.
    pub extra_selectors: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "error".to_string(),
            log_file: false,
            cache_dir: None,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// A loaded configuration and what happened while loading it.
///
/// Loading runs before logging is configured (the log level lives in the
/// config), so the outcome is reported afterwards with [`LoadedConfig::log`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: LoadSource,
}

/// Where the configuration came from.
#[derive(Debug, Clone)]
pub enum LoadSource {
    /// No config file; built-in defaults.
    Defaults,
    /// Read from this file.
    File(PathBuf),
    /// The file could not be read or parsed; built-in defaults.
    Invalid { path: PathBuf, error: String },
}

impl LoadedConfig {
    /// Emit the outcome of loading through `tracing`.
    pub fn log(&self) {
        match &self.source {
            LoadSource::Defaults => tracing::debug!("No config file, using defaults"),
            LoadSource::File(path) => tracing::info!(path = %path.display(), "Loaded config"),
            // Not fatal, but shown at the default `error` level.
            LoadSource::Invalid { path, error } => tracing::error!(
                path = %path.display(),
                error = %error,
                "Failed to load config, using defaults"
            ),
        }
    }
}

/// Load configuration, searching standard locations.
///
/// Falls back to the default configuration if no file is found or on error.
pub fn load_config() -> LoadedConfig {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => LoadedConfig {
            config: Config::default(),
            source: LoadSource::Defaults,
        },
    }
}

/// Load configuration from `path`, falling back to defaults on error.
pub fn load_config_from(path: &Path) -> LoadedConfig {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| format!("read failed: {e}"))
        .and_then(|contents| toml::from_str::<Config>(&contents).map_err(|e| e.to_string()));

    match parsed {
        Ok(config) => LoadedConfig {
            config,
            source: LoadSource::File(path.to_path_buf()),
        },
        Err(error) => LoadedConfig {
            config: Config::default(),
            source: LoadSource::Invalid {
                path: path.to_path_buf(),
                error,
            },
        },
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("HTML2EML_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("html2eml").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("html2eml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "error");
        assert!(!cfg.general.log_file);
        assert!(cfg.message.from.is_none());
        assert!(cfg.sanitize.extra_selectors.is_empty());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[message]
from = "Reader <me@example.com>"

[sanitize]
extra_selectors = [".newsletter-signup", "aside.related"]
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.message.from.as_deref(), Some("Reader <me@example.com>"));
        assert_eq!(cfg.message.to, None);
        assert_eq!(cfg.sanitize.extra_selectors.len(), 2);
        assert_eq!(cfg.general.log_level, "error");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.message.to = Some("inbox@example.com".to_string());
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.message.to, cfg.message.to);
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"warn\"\n").unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.config.general.log_level, "warn");
        assert!(matches!(loaded.source, LoadSource::File(ref p) if p == &path));
    }

    #[test]
    fn test_load_config_invalid_keeps_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[general\nlog_level = ").unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.config.general.log_level, "error");
        match loaded.source {
            LoadSource::Invalid { path: p, error } => {
                assert_eq!(p, path);
                assert!(!error.is_empty());
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_load_config_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&tmp.path().join("absent.toml"));
        assert!(matches!(loaded.source, LoadSource::Invalid { .. }));
        assert!(loaded.config.message.from.is_none());
    }

    #[test]
    fn test_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/h2e"));
        assert_eq!(cache_dir(&cfg), PathBuf::from("/tmp/h2e"));
    }
}
