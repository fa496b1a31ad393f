//! metadump subcommands

pub mod find;
pub mod hierarchy;
pub mod info;
pub mod list;
pub mod members;
pub mod modules;

use objbridge_meta::{major_of, minor_of};

/// `"M.m"` for a recorded version, `None` when unset
pub(crate) fn version_label(encoded: u8) -> Option<String> {
    (encoded != 0).then(|| format!("{}.{}", major_of(encoded), minor_of(encoded)))
}

/// `" (since M.m)"` suffix, or nothing
pub(crate) fn since_suffix(encoded: u8) -> String {
    version_label(encoded)
        .map(|v| format!(" (since {})", v))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use objbridge_meta::encode_version;

    #[test]
    fn test_version_labels() {
        assert_eq!(version_label(0), None);
        assert_eq!(version_label(encode_version(13, 2)).as_deref(), Some("13.2"));
        assert_eq!(since_suffix(encode_version(8, 0)), " (since 8.0)");
        assert_eq!(since_suffix(0), "");
    }
}
