//! Config subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use loxly_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProfileEntry<'a> {
    name: &'a str,
    default: bool,
    #[serde(flatten)]
    profile: &'a Profile,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Config ID")]
    config_id: String,
    #[tabled(rename = "Structure file")]
    structure_file: String,
}

impl From<&ProfileEntry<'_>> for ProfileRow {
    fn from(e: &ProfileEntry<'_>) -> Self {
        Self {
            marker: if e.default { "*" } else { "" },
            name: e.name.to_owned(),
            host: e.profile.host.clone(),
            config_id: e
                .profile
                .config_id
                .map_or_else(|| "-".into(), |id| id.to_string()),
            structure_file: e
                .profile
                .structure_file
                .as_ref()
                .map_or_else(|| "-".into(), |p| p.display().to_string()),
        }
    }
}

fn save(cfg: &Config, global: &GlobalOpts, message: &str) -> Result<(), CliError> {
    config::save_config(cfg)?;
    if !global.quiet {
        eprintln!("{message}");
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let out = output::render_single(
                &global.format(),
                cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let default = config::active_profile_name(global, cfg);
            let entries: Vec<ProfileEntry<'_>> = cfg
                .profiles
                .iter()
                .map(|(name, profile)| ProfileEntry {
                    name,
                    default: *name == default,
                    profile,
                })
                .collect();
            let out = output::render_list(
                &global.format(),
                &entries,
                |e| ProfileRow::from(e),
                |e| e.name.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Add {
            name,
            host,
            structure_file,
            keep_unchanged,
        } => {
            let mut profile = Profile::new(host);
            profile.config_id = global
                .config_id
                .as_deref()
                .map(config::parse_config_id)
                .transpose()?;
            profile.structure_file = structure_file;
            profile.ignore_unchanged_values = !keep_unchanged;

            let mut cfg = cfg.clone();
            if cfg.profiles.is_empty() {
                cfg.default_profile = Some(name.clone());
            }
            let replaced = cfg.profiles.insert(name.clone(), profile).is_some();
            tracing::info!(profile = %name, replaced, "saving profile");
            save(&cfg, global, &format!("Profile '{name}' saved"))
        }

        ConfigCommand::Remove { name } => {
            let mut cfg = cfg.clone();
            if cfg.profiles.remove(&name).is_none() {
                return Err(config::profile_not_found(name, &cfg));
            }
            if cfg.default_profile.as_deref() == Some(name.as_str()) {
                cfg.default_profile = cfg.profiles.keys().next().cloned();
            }
            save(&cfg, global, &format!("Profile '{name}' removed"))
        }

        ConfigCommand::Use { name } => {
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, cfg));
            }
            let mut cfg = cfg.clone();
            cfg.default_profile = Some(name.clone());
            save(&cfg, global, &format!("Default profile set to '{name}'"))
        }
    }
}
