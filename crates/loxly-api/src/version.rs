// ── API version gate ──
//
// The Miniserver reports its firmware as `major.minor.patch.build`.
// Newer protocol features (token authentication, key exchange) are gated
// on major/minor only.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Parsed firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<u32>,
}

impl ApiVersion {
    /// Parse `major.minor[.patch[.build]]`.
    ///
    /// Major and minor must be numeric. Patch and build are kept when
    /// numeric and otherwise ignored, along with anything after them.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let malformed = |reason| Error::MalformedVersion {
            value: text.to_owned(),
            reason,
        };

        let mut parts = text.trim().split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| malformed("missing major version"))?
            .parse()
            .map_err(|_| malformed("major version is not a number"))?;
        let minor = parts
            .next()
            .ok_or_else(|| malformed("missing minor version"))?
            .parse()
            .map_err(|_| malformed("minor version is not a number"))?;
        let patch = parts.next().and_then(|p| p.parse().ok());
        let build = patch.and(parts.next().and_then(|p| p.parse().ok()));

        Ok(Self {
            major,
            minor,
            patch,
            build,
        })
    }

    /// `true` when the major version is at least `major`.
    pub fn is_at_least(&self, major: u32) -> bool {
        self.major >= major
    }

    /// `true` when `(major, minor)` is at least the given pair.
    pub fn is_at_least_minor(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor).cmp(&(major, minor)) != Ordering::Less
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
            if let Some(build) = self.build {
                write!(f, ".{build}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ── ApiInfo ─────────────────────────────────────────────────────────

/// Controller identity from the `jdev/cfg/apiKey` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiInfo {
    /// Serial number, e.g. `50:4F:94:10:00:FF`.
    pub snr: Option<String>,
    pub version: Option<ApiVersion>,
}

#[derive(Deserialize)]
struct RawApiInfo {
    snr: Option<String>,
    version: Option<String>,
}

impl ApiInfo {
    /// Parse the response `value`: an object written with single quotes.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let json = value.replace('\'', "\"");
        let raw: RawApiInfo = serde_json::from_str(&json).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_owned(),
        })?;
        let version = raw.version.as_deref().map(ApiVersion::parse).transpose()?;
        Ok(Self {
            snr: raw.snr,
            version,
        })
    }

    /// Token authentication needs firmware 9 or later.
    pub fn supports_tokens(&self) -> bool {
        self.version.is_some_and(|v| v.is_at_least(9))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gates_on_major_and_minor() {
        let v = ApiVersion::parse("9.1.10.30").unwrap();
        assert!(v.is_at_least(9));
        assert!(!v.is_at_least(10));
        assert!(v.is_at_least_minor(9, 1));
        assert!(!v.is_at_least_minor(9, 2));
    }

    #[test]
    fn higher_major_beats_higher_minor() {
        let v = ApiVersion::parse("10.0").unwrap();
        assert!(v.is_at_least_minor(9, 3));
        assert!(!v.is_at_least_minor(10, 1));
    }

    #[test]
    fn keeps_all_components() {
        let v: ApiVersion = "9.1.10.30".parse().unwrap();
        assert_eq!(
            v,
            ApiVersion {
                major: 9,
                minor: 1,
                patch: Some(10),
                build: Some(30)
            }
        );
        assert_eq!(v.to_string(), "9.1.10.30");
    }

    #[test]
    fn tolerates_malformed_suffix() {
        let v = ApiVersion::parse("8.3.beta").unwrap();
        assert_eq!((v.major, v.minor, v.patch, v.build), (8, 3, None, None));
        assert_eq!(v.to_string(), "8.3");
    }

    #[test]
    fn fails_fast_without_major_minor() {
        for bad in ["", "9", "9.", "x.1", "9.y", ".1"] {
            let err = ApiVersion::parse(bad).unwrap_err();
            assert!(matches!(err, Error::MalformedVersion { .. }), "{bad}");
        }
    }

    #[test]
    fn parses_api_key_value() {
        let info = ApiInfo::parse("{'snr': '50:4F:94:10:00:FF', 'version':'9.1.10.30'}").unwrap();
        assert_eq!(info.snr.as_deref(), Some("50:4F:94:10:00:FF"));
        assert_eq!(info.version.unwrap().minor, 1);
        assert!(info.supports_tokens());
    }

    #[test]
    fn api_info_without_version() {
        let info = ApiInfo::parse("{'snr': 'abc'}").unwrap();
        assert_eq!(info.version, None);
        assert!(!info.supports_tokens());
    }
}
