//! Stale pre-release artifact selection
//!
//! Non-release builds accumulate on development and branch channels as
//! commits land; only the newest build of a version lineage is worth
//! keeping. Given the artifact just uploaded and the files currently on
//! the channel, this selects the superseded builds for removal.
//!
//! Release tags are protected here unconditionally. The `main` channel is
//! additionally protected one level up: the caller never invokes removal
//! for `main` at all.

use crate::artifact::ArtifactIdentity;
use crate::version::{classify, same_version_different_build};

/// Channel files superseded by `reference`.
///
/// A candidate is selected when every rule holds:
/// same package, same build configuration, same platform, a different
/// version string, not a release tag, and another build of the same
/// version lineage as `reference`. Returned in filter order; callers must
/// not depend on any particular ordering.
pub fn select_for_removal(
    reference: &ArtifactIdentity,
    channel_files: &[ArtifactIdentity],
) -> Vec<ArtifactIdentity> {
    channel_files
        .iter()
        .filter(|f| {
            f.package == reference.package
                && f.configuration == reference.configuration
                && f.platform == reference.platform
                && f.version != reference.version
                && !classify(&f.version).is_release_tag
                && same_version_different_build(&reference.version, &f.version)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(version: &str) -> ArtifactIdentity {
        ArtifactIdentity {
            owner: "menpo".to_string(),
            package: "pkga".to_string(),
            version: version.to_string(),
            platform: "linux-64".to_string(),
            configuration: "np110py27_0".to_string(),
            basename: format!("linux-64/pkga-{}-np110py27_0.tar.bz2", version),
        }
    }

    #[test]
    fn test_selects_superseded_build_only() {
        let channel = vec![ident("1.2.3+1.aaa"), ident("1.2.3+2.bbb"), ident("2.0.0")];
        let reference = ident("1.2.3+2.bbb");

        let removals = select_for_removal(&reference, &channel);

        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].version, "1.2.3+1.aaa");
    }

    #[test]
    fn test_release_tags_are_protected() {
        let channel = vec![ident("1.2.3")];
        let reference = ident("1.2.3+4.abc");

        // 1.2.3 is a prefix of the reference base, but a release tag
        assert!(select_for_removal(&reference, &channel).is_empty());
    }

    #[test]
    fn test_reference_itself_is_excluded() {
        let channel = vec![ident("1.2.3+2.bbb")];
        let reference = ident("1.2.3+2.bbb");

        assert!(select_for_removal(&reference, &channel).is_empty());
    }

    #[test]
    fn test_other_lineage_is_kept() {
        let channel = vec![ident("1.3.0+1.abc"), ident("1.2.2+9.old")];
        let reference = ident("1.2.3+2.bbb");

        assert!(select_for_removal(&reference, &channel).is_empty());
    }

    #[test]
    fn test_mismatched_axes_are_kept() {
        let mut other_platform = ident("1.2.3+1.aaa");
        other_platform.platform = "osx-64".to_string();
        let mut other_config = ident("1.2.3+1.aaa");
        other_config.configuration = "np110py35_0".to_string();
        let mut other_package = ident("1.2.3+1.aaa");
        other_package.package = "pkgb".to_string();

        let channel = vec![other_platform, other_config, other_package];
        let reference = ident("1.2.3+2.bbb");

        assert!(select_for_removal(&reference, &channel).is_empty());
    }

    #[test]
    fn test_idempotent_after_purge() {
        let channel = vec![ident("1.2.3+1.aaa"), ident("1.2.3+2.bbb"), ident("2.0.0")];
        let reference = ident("1.2.3+2.bbb");

        let removals = select_for_removal(&reference, &channel);
        let remaining: Vec<ArtifactIdentity> = channel
            .into_iter()
            .filter(|f| !removals.contains(f))
            .collect();

        assert!(select_for_removal(&reference, &remaining).is_empty());
    }

    #[test]
    fn test_rc_builds_on_branch_are_removable() {
        let channel = vec![ident("1.2.3rc1+1.aaa")];
        let reference = ident("1.2.3rc1+2.bbb");

        let removals = select_for_removal(&reference, &channel);
        assert_eq!(removals.len(), 1);
    }
}
