//! Shared helpers for command handlers.

use std::fmt::Write;

use loxly_api::Id128;

use crate::error::CliError;

/// Parse hex bytes, ignoring whitespace, commas and `0x` prefixes.
pub fn parse_hex_bytes(parts: &[String]) -> Result<Vec<u8>, CliError> {
    let joined = parts.join(" ");
    let digits: String = joined
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|word| word.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    let invalid = |reason: &str| CliError::Validation {
        field: "hex".into(),
        reason: format!("{reason}: {joined}"),
    };
    if digits.len() % 2 != 0 {
        return Err(invalid("odd number of hex digits"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("not hex"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid("not hex")))
        .collect()
}

/// Lowercase hex with a space between bytes.
pub fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub fn parse_id(text: &str) -> Result<Id128, CliError> {
    Id128::decode(text).map_err(|e| CliError::InvalidIdentifier {
        kind: "identifier",
        value: text.into(),
        reason: match e {
            loxly_api::Error::MalformedIdentifier { reason, .. } => reason.into(),
            other => other.to_string(),
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_common_spellings() {
        let expected = vec![0x03, 0x00, 0xfd, 0xfa];
        assert_eq!(parse_hex_bytes(&["03 00 fd fa".into()]).unwrap(), expected);
        assert_eq!(parse_hex_bytes(&["030", "0fdfa"].map(String::from)).unwrap(), expected);
        assert_eq!(parse_hex_bytes(&["0x03,0x00,0xFD,0xFA".into()]).unwrap(), expected);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(parse_hex_bytes(&["030".into()]).is_err());
        assert!(parse_hex_bytes(&["zz".into()]).is_err());
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(hex_bytes(&[0x03, 0xab]), "03 ab");
        assert_eq!(hex_bytes(&[]), "");
    }
}
