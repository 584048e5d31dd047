//! Identifier, config ID and permission conversions.

use serde::Serialize;

use loxly_api::{ConfigId, Id128, TokenPermissions};

use crate::cli::{ConfigIdArgs, GlobalOpts, IdArgs, PermissionName, PermissionsArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Id ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct IdView {
    wire: String,
    canonical: String,
    /// Binary event-table layout.
    bytes_le: String,
}

impl From<Id128> for IdView {
    fn from(id: Id128) -> Self {
        let mut le = Vec::with_capacity(loxly_api::id::ID128_BINARY_LEN);
        id.write_le(&mut le);
        Self {
            wire: id.encode(),
            canonical: id.to_canonical(),
            bytes_le: util::hex_bytes(&le),
        }
    }
}

pub fn handle_id(args: &IdArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let view = IdView::from(util::parse_id(&args.value)?);
    let out = output::render_single(
        &global.format(),
        &view,
        |v| {
            output::detail_lines(&[
                ("Wire", v.wire.clone()),
                ("Canonical", v.canonical.clone()),
                ("Bytes (LE)", v.bytes_le.clone()),
            ])
        },
        |v| v.wire.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Config ID ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ConfigIdView {
    value: u64,
    hex: String,
    external: String,
}

impl From<ConfigId> for ConfigIdView {
    fn from(id: ConfigId) -> Self {
        Self {
            value: id.value(),
            hex: id.to_hex(),
            external: id.to_external(),
        }
    }
}

fn parse_numeric(text: &str) -> Result<ConfigId, CliError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map(ConfigId::new).map_err(|e| CliError::InvalidIdentifier {
        kind: "config ID",
        value: text.into(),
        reason: e.to_string(),
    })
}

pub fn handle_config_id(args: &ConfigIdArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = if args.numeric {
        parse_numeric(&args.value)?
    } else {
        config::parse_config_id(&args.value)?
    };

    let view = ConfigIdView::from(id);
    let out = output::render_single(
        &global.format(),
        &view,
        |v| {
            output::detail_lines(&[
                ("External", v.external.clone()),
                ("Hex", v.hex.clone()),
                ("Value", v.value.to_string()),
            ])
        },
        |v| v.external.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Permissions ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PermissionsView {
    bitmask: i32,
    permissions: Vec<&'static str>,
}

impl From<TokenPermissions> for PermissionsView {
    fn from(perms: TokenPermissions) -> Self {
        Self {
            bitmask: perms.bitmask(),
            permissions: perms.iter_names().map(|(name, _)| name).collect(),
        }
    }
}

fn permission(name: PermissionName) -> TokenPermissions {
    match name {
        PermissionName::Web => TokenPermissions::WEB,
        PermissionName::App => TokenPermissions::APP,
    }
}

pub fn handle_permissions(args: &PermissionsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (perms, plain_mask) = match args.mask {
        Some(mask) => (TokenPermissions::from_bitmask(mask), false),
        None => (
            args.grant
                .iter()
                .fold(TokenPermissions::empty(), |acc, name| acc | permission(*name)),
            true,
        ),
    };

    let view = PermissionsView::from(perms);
    let out = output::render_single(
        &global.format(),
        &view,
        |v| {
            output::detail_lines(&[
                ("Bitmask", v.bitmask.to_string()),
                ("Permissions", v.permissions.join(", ")),
            ])
        },
        |v| {
            if plain_mask {
                v.bitmask.to_string()
            } else {
                v.permissions.join(",")
            }
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
