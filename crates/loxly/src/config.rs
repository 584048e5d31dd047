//! Flag-aware wrappers over `loxly-config`: profile selection and config
//! ID resolution with CLI overrides.

use clap::ValueEnum;

use loxly_api::ConfigId;
use loxly_config::{Config, Profile};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use loxly_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile. A profile named with `--profile` must exist; a
/// missing default profile is not an error.
pub fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<Option<&'a Profile>, CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok(Some(profile)),
        None if global.profile.is_some() => Err(profile_not_found(name, config)),
        None => Ok(None),
    }
}

pub fn profile_not_found(name: String, config: &Config) -> CliError {
    let available = if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    CliError::ProfileNotFound { name, available }
}

/// Parse config ID text as given on the command line.
pub fn parse_config_id(text: &str) -> Result<ConfigId, CliError> {
    ConfigId::from_external(text).map_err(|e| CliError::InvalidIdentifier {
        kind: "config ID",
        value: text.into(),
        reason: match e {
            loxly_api::Error::MalformedConfigId { reason, .. } => reason.into(),
            other => other.to_string(),
        },
    })
}

/// Config ID from `--config-id` (flag > env > profile), if any.
pub fn config_id(global: &GlobalOpts, config: &Config) -> Result<Option<ConfigId>, CliError> {
    if let Some(ref text) = global.config_id {
        return parse_config_id(text).map(Some);
    }
    Ok(active_profile(global, config)?.and_then(|p| p.config_id))
}

pub fn require_config_id(global: &GlobalOpts, config: &Config) -> Result<ConfigId, CliError> {
    config_id(global, config)?.ok_or(CliError::NoConfigId)
}

/// Fill in `--output` from the config defaults when not given.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_some() {
        return;
    }
    match OutputFormat::from_str(&config.defaults.output, true) {
        Ok(format) => global.output = Some(format),
        Err(_) => tracing::warn!(
            output = %config.defaults.output,
            "ignoring unknown default output format"
        ),
    }
}
