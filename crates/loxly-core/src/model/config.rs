// ── Config snapshot ──

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use loxly_api::ConfigId;

use crate::error::CoreError;

/// Format of structure-file modification dates, always UTC.
pub const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One Miniserver configuration and when its structure file last changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub id: ConfigId,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Config {
    pub fn new(id: ConfigId) -> Self {
        Self {
            id,
            last_modified: None,
        }
    }

    pub fn with_last_modified(self, last_modified: DateTime<Utc>) -> Self {
        Self {
            last_modified: Some(last_modified),
            ..self
        }
    }

    /// `true` when the Miniserver reports a structure file newer than the
    /// one this config was built from, or none was ever loaded.
    pub fn is_outdated_by(&self, remote: DateTime<Utc>) -> bool {
        self.last_modified.is_none_or(|local| local < remote)
    }
}

/// Parse a `2016-09-19 08:28:15` style timestamp as UTC.
pub fn parse_last_modified(text: &str) -> Result<DateTime<Utc>, CoreError> {
    NaiveDateTime::parse_from_str(text.trim(), LAST_MODIFIED_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| CoreError::Response {
            message: format!("invalid last modified date: {e}"),
            body: text.to_owned(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_timestamp() {
        let ts = parse_last_modified("2016-09-19 08:28:15").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2016, 9, 19, 8, 28, 15).unwrap());
        assert!(parse_last_modified("19.09.2016").is_err());
    }

    #[test]
    fn newer_remote_outdates_config() {
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let config = Config::new(ConfigId::new(1));
        assert!(config.is_outdated_by(early));

        let config = config.with_last_modified(early);
        assert!(config.is_outdated_by(late));
        assert!(!config.is_outdated_by(early));
    }
}
