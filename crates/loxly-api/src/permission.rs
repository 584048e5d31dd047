// ── Token permissions ──
//
// The Miniserver grants authentication tokens a set of permissions,
// transmitted as an integer bitmask. Firmware adds bits over time, so
// unknown bits are dropped rather than rejected.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Permissions an authentication token may carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenPermissions: i32 {
        /// Short-lived token for the web interface.
        const WEB = 2;
        /// Long-lived token for apps.
        const APP = 4;
    }
}

impl TokenPermissions {
    /// The wire bitmask: OR of every member's bit value.
    pub fn bitmask(self) -> i32 {
        self.bits()
    }

    /// Decode a wire bitmask, ignoring bits no known permission uses.
    pub fn from_bitmask(mask: i32) -> Self {
        let perms = Self::from_bits_truncate(mask);
        let unknown = mask & !Self::all().bits();
        if unknown != 0 {
            tracing::trace!(mask, unknown, "ignoring unknown permission bits");
        }
        perms
    }
}

impl fmt::Display for TokenPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_for_single_permission() {
        assert_eq!(TokenPermissions::APP.bitmask(), 4);
    }

    #[test]
    fn bitmask_for_permissions() {
        let perms = TokenPermissions::APP | TokenPermissions::WEB;
        assert_eq!(perms.bitmask(), 6);
    }

    #[test]
    fn permissions_for_bitmask() {
        assert_eq!(TokenPermissions::from_bitmask(4), TokenPermissions::APP);
        assert_eq!(
            TokenPermissions::from_bitmask(6),
            TokenPermissions::APP | TokenPermissions::WEB
        );
    }

    #[test]
    fn unknown_high_bits_are_ignored() {
        assert_eq!(TokenPermissions::from_bitmask(1026), TokenPermissions::WEB);
        assert_eq!(TokenPermissions::from_bitmask(1028), TokenPermissions::APP);
        assert!(TokenPermissions::from_bitmask(1).is_empty());
    }

    #[test]
    fn display_lists_names() {
        assert_eq!(
            (TokenPermissions::WEB | TokenPermissions::APP).to_string(),
            "WEB,APP"
        );
        assert_eq!(TokenPermissions::empty().to_string(), "");
    }
}
