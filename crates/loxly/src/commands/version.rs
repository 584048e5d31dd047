//! Firmware version parsing and feature gates.

use serde::Serialize;

use loxly_api::{ApiInfo, ApiVersion};

use crate::cli::{GlobalOpts, VersionArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct VersionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    snr: Option<String>,
    version: Option<ApiVersion>,
    supports_tokens: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    at_least: Option<Requirement>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Requirement {
    major: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor: Option<u32>,
    satisfied: bool,
}

/// Parse `major` or `major.minor`.
fn parse_requirement(text: &str) -> Result<(u32, Option<u32>), CliError> {
    let invalid = || CliError::Validation {
        field: "--at-least".into(),
        reason: format!("expected MAJOR or MAJOR.MINOR, got '{text}'"),
    };
    let (major, minor) = match text.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (text, None),
    };
    let major = major.parse::<u32>().map_err(|_| invalid())?;
    let minor = minor
        .map(str::parse::<u32>)
        .transpose()
        .map_err(|_| invalid())?;
    Ok((major, minor))
}

fn detail(v: &VersionView) -> String {
    let mut pairs = Vec::new();
    if let Some(ref snr) = v.snr {
        pairs.push(("Serial", snr.clone()));
    }
    pairs.push((
        "Version",
        v.version.map_or_else(|| "-".into(), |ver| ver.to_string()),
    ));
    pairs.push(("Tokens", v.supports_tokens.to_string()));
    if let Some(req) = v.at_least {
        let wanted = match req.minor {
            Some(minor) => format!("{}.{minor}", req.major),
            None => req.major.to_string(),
        };
        pairs.push(("At least", format!("{wanted}: {}", req.satisfied)));
    }
    output::detail_lines(&pairs)
}

pub fn handle(args: &VersionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let info = if args.value.trim_start().starts_with('{') {
        ApiInfo::parse(&args.value)?
    } else {
        ApiInfo {
            snr: None,
            version: Some(ApiVersion::parse(&args.value)?),
        }
    };

    let at_least = args
        .at_least
        .as_deref()
        .map(parse_requirement)
        .transpose()?
        .map(|(major, minor)| Requirement {
            major,
            minor,
            satisfied: info.version.is_some_and(|v| match minor {
                Some(minor) => v.is_at_least_minor(major, minor),
                None => v.is_at_least(major),
            }),
        });

    let view = VersionView {
        supports_tokens: info.supports_tokens(),
        snr: info.snr,
        version: info.version,
        at_least,
    };
    let out = output::render_single(&global.format(), &view, detail, |v| match v.at_least {
        Some(req) => req.satisfied.to_string(),
        None => v.version.map(|ver| ver.to_string()).unwrap_or_default(),
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn requirement_forms() {
        assert_eq!(parse_requirement("9").unwrap(), (9, None));
        assert_eq!(parse_requirement("10.2").unwrap(), (10, Some(2)));
        assert!(parse_requirement("ten").is_err());
        assert!(parse_requirement("9.x").is_err());
    }
}
