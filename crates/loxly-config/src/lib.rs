//! Shared configuration for loxly tools.
//!
//! TOML profiles, one per Miniserver, layered as built-in defaults, then the
//! config file, then `LOXLY_` environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use loxly_api::ConfigId;

pub const ENV_PREFIX: &str = "LOXLY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named Miniserver profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Output format used when `--output` is not given.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}

/// One Miniserver.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Miniserver host or address, e.g. "192.168.1.77".
    pub host: String,

    /// Config ID in friendly or 16-digit hex form.
    pub config_id: Option<ConfigId>,

    /// Cached copy of the XML project file.
    pub structure_file: Option<PathBuf>,

    /// Skip value events whose value did not change.
    #[serde(default = "default_true")]
    pub ignore_unchanged_values: bool,

    /// `Type` values of containers whose controls are mapped. Empty means
    /// the scanner defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_types: Vec<String>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            config_id: None,
            structure_file: None,
            ignore_unchanged_values: true,
            container_types: Vec::new(),
        }
    }

    /// The profile's config ID, required by commands that scope data.
    pub fn require_config_id(&self, profile_name: &str) -> Result<ConfigId, ConfigError> {
        self.config_id.ok_or_else(|| ConfigError::Validation {
            field: format!("profiles.{profile_name}.config_id"),
            reason: "not set".into(),
        })
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Resolve `name`, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "loxly", "loxly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("loxly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Providers for the config at `path`: defaults, file, then environment.
///
/// Nested keys in the environment use a double underscore, e.g.
/// `LOXLY_PROFILES__HOME__HOST`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from the canonical path and environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` and environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    tracing::debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    tracing::debug!(path = %path.display(), "saved config");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn profile_falls_back_to_default_name() {
        let mut cfg = Config::default();
        cfg.profiles.insert("default".into(), Profile::new("10.0.0.2"));
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.host, "10.0.0.2");
    }

    #[test]
    fn missing_profile_is_reported() {
        let cfg = Config::default();
        let err = cfg.profile(Some("garage")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { ref name } if name == "garage"));
    }

    #[test]
    fn config_id_is_required_on_demand() {
        let profile = Profile::new("host");
        let err = profile.require_config_id("home").unwrap_err();
        assert_eq!(err.to_string(), "invalid profiles.home.config_id: not set");
    }
}
