// ── Source IDs ──
//
// Every tracked entity is published under a durable, path-like source ID.
// Derivation is a pure function of its inputs: the same config, entity and
// override always give the same string.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use loxly_api::{ConfigId, Id128};

/// Upper bound on a source ID, in characters.
pub const SOURCE_ID_MAX_LEN: usize = 32;

/// Source ID for `uuid` within `config_id`.
///
/// With a non-empty `override_id` the result is
/// `/{config id as 16 hex digits}/{override_id}`. Without one, the config
/// ID (big-endian) and the identifier bytes are base64url encoded without
/// padding, giving exactly 32 characters.
pub fn source_id(config_id: ConfigId, uuid: Id128, override_id: Option<&str>) -> String {
    match override_id.filter(|o| !o.is_empty()) {
        Some(name) => format!("/{}/{name}", config_id.to_hex()),
        None => {
            let mut bytes = [0_u8; 24];
            bytes[..8].copy_from_slice(&config_id.value().to_be_bytes());
            bytes[8..].copy_from_slice(uuid.as_bytes());
            URL_SAFE_NO_PAD.encode(bytes)
        }
    }
}

/// Strip all whitespace from `name` and cut it to at most `max_len`
/// characters.
pub fn sanitize_source_id(name: &str, max_len: usize) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .take(max_len)
        .collect()
}

/// Room left for a mapping name once `/{config key}/` is prepended.
pub fn max_mapping_len(config_id: ConfigId) -> usize {
    SOURCE_ID_MAX_LEN.saturating_sub(config_id.to_external().len() + 2)
}
