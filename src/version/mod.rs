//! Version string classification
//!
//! Classifies PEP 440-style version strings as produced by versioneer and
//! miniver. A plain tag (`1.2.3`) carries no build metadata; development
//! builds append `+<distance>.<commit>` metadata as commits land.
//!
//! The four predicates are independent structural rules, not a
//! priority-ordered state machine. Callers combine them explicitly: the
//! build step checks `is_release_tag || is_rc_tag` in one branch, while
//! channel resolution and purge protection check `is_release_tag` alone.

mod detect;

pub use detect::{detect_version, dirs_containing_file, VersionError};

/// Structural classification of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTags {
    /// No build-metadata separator (`+`) present.
    pub is_tag: bool,
    /// Final dot-segment begins with `dev`.
    pub is_dev_tag: bool,
    /// Portion before any `+` contains `rc`.
    pub is_rc_tag: bool,
    /// A tag that is neither an rc nor a dev tag.
    pub is_release_tag: bool,
}

/// Classify a version string.
///
/// Total over all inputs; an empty string is a tag (vacuously) but neither
/// a dev, rc, nor release tag is derived from any further structure.
pub fn classify(version: &str) -> VersionTags {
    let is_tag = !version.contains('+');
    let is_dev_tag = version
        .rsplit('.')
        .next()
        .is_some_and(|segment| segment.starts_with("dev"));
    let before_metadata = version.split('+').next().unwrap_or(version);
    let is_rc_tag = before_metadata.contains("rc");
    VersionTags {
        is_tag,
        is_dev_tag,
        is_rc_tag,
        is_release_tag: is_tag && !is_rc_tag && !is_dev_tag,
    }
}

/// True when `candidate` is another build of the same version lineage as
/// `reference`: the part of `reference` before the first `+` is a literal
/// string prefix of `candidate`.
pub fn same_version_different_build(reference: &str, candidate: &str) -> bool {
    let base = reference.split('+').next().unwrap_or(reference);
    candidate.starts_with(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_tag_is_release() {
        let tags = classify("1.2.3");
        assert!(tags.is_tag);
        assert!(tags.is_release_tag);
        assert!(!tags.is_dev_tag);
        assert!(!tags.is_rc_tag);
    }

    #[test]
    fn test_build_metadata_is_not_release() {
        let tags = classify("1.2.3+5.gabcdef");
        assert!(!tags.is_tag);
        assert!(!tags.is_release_tag);
    }

    #[test]
    fn test_rc_tag() {
        let tags = classify("1.2.3rc1");
        assert!(tags.is_rc_tag);
        assert!(!tags.is_release_tag);
    }

    #[test]
    fn test_rc_detection_ignores_metadata() {
        // `rc` after the `+` does not make this a release candidate
        let tags = classify("1.2.3+2.grc4bee");
        assert!(!tags.is_rc_tag);
        assert!(!tags.is_release_tag);
    }

    #[test]
    fn test_dev_tag() {
        let tags = classify("1.2.3.dev0");
        assert!(tags.is_dev_tag);
        assert!(!tags.is_release_tag);
    }

    #[test]
    fn test_rc_and_dev_are_independent() {
        // Both predicates hold; neither wins, and release is excluded
        let tags = classify("1.2.3rc1.dev0");
        assert!(tags.is_rc_tag);
        assert!(tags.is_dev_tag);
        assert!(tags.is_tag);
        assert!(!tags.is_release_tag);
    }

    #[test]
    fn test_empty_string_degenerate() {
        let tags = classify("");
        assert!(tags.is_tag);
        assert!(!tags.is_dev_tag);
        assert!(!tags.is_rc_tag);
        // empty splits to a single empty segment, so release holds vacuously
        assert!(tags.is_release_tag);
    }

    #[test]
    fn test_release_implies_tag() {
        for v in [
            "1.2.3",
            "1.2.3rc1",
            "1.2.3.dev0",
            "1.2.3+5.gabcdef",
            "2.0.0rc2+1.gfff",
            "",
            "weird",
        ] {
            let tags = classify(v);
            if tags.is_release_tag {
                assert!(tags.is_tag, "release tag {v:?} must also be a tag");
            }
        }
    }

    #[test]
    fn test_same_version_different_build() {
        assert!(same_version_different_build("1.2.3", "1.2.3+7.deadbee"));
        assert!(same_version_different_build("1.2.3+2.bbb", "1.2.3+1.aaa"));
        assert!(!same_version_different_build("1.2.3", "1.3.0+1.abc"));
        assert!(!same_version_different_build("1.2.3+1.aaa", "2.0.0"));
    }
}
