//! Commit and date stamped in by `build.rs`.
//!
//! The commit is a 7 character short hash, or "unknown" when the crate
//! was built outside a git checkout without `BUILD_COMMIT` set.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// `0.1.0 (abc1234 2026-01-31)`, shown by `--version`.
pub fn version_string() -> String {
    format!(
        "{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        BUILD_COMMIT,
        BUILD_DATE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_is_short_hash_or_unknown() {
        assert!(!BUILD_COMMIT.is_empty());
        assert!(
            BUILD_COMMIT == "unknown"
                || (BUILD_COMMIT.len() == 7 && BUILD_COMMIT.chars().all(|c| c.is_ascii_hexdigit())),
            "unexpected commit {:?}",
            BUILD_COMMIT
        );
    }

    #[test]
    fn test_date_is_set() {
        assert!(!BUILD_DATE.trim().is_empty());
    }

    #[test]
    fn test_version_string_has_no_blank_fields() {
        let version = version_string();
        assert!(version.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(version.contains(BUILD_COMMIT));
        assert!(!version.contains("( "));
        assert!(!version.contains("  "));
    }
}
