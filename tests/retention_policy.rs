//! Retention selection against realistic channel listings
//!
//! Exercises the purge decision from parsed channel entries, the way the
//! upload path drives it: identities come from full names, the reference
//! from a build path.

use std::path::PathBuf;

use condaci::artifact::ArtifactIdentity;
use condaci::select_for_removal;

fn entry(full_name: &str) -> ArtifactIdentity {
    ArtifactIdentity::from_full_name(full_name).unwrap()
}

fn develop_channel() -> Vec<ArtifactIdentity> {
    vec![
        entry("menpo/pkga/1.2.3+1.aaa/linux-64/pkga-1.2.3+1.aaa-np110py27_0.tar.bz2"),
        entry("menpo/pkga/1.2.3+2.bbb/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2"),
        entry("menpo/pkga/2.0.0/linux-64/pkga-2.0.0-np110py27_0.tar.bz2"),
        // same lineage, different platform: untouched
        entry("menpo/pkga/1.2.3+1.ccc/osx-64/pkga-1.2.3+1.ccc-np110py27_0.tar.bz2"),
        // same lineage, different configuration: untouched
        entry("menpo/pkga/1.2.3+1.ddd/linux-64/pkga-1.2.3+1.ddd-np110py35_0.tar.bz2"),
        // different package entirely
        entry("menpo/pkgb/1.2.3+1.eee/linux-64/pkgb-1.2.3+1.eee-np110py27_0.tar.bz2"),
    ]
}

fn reference() -> ArtifactIdentity {
    ArtifactIdentity::from_build_path(
        &PathBuf::from("/home/ci/miniconda/conda-bld/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2"),
        "menpo",
    )
    .unwrap()
}

#[test]
fn selects_exactly_the_superseded_build() {
    let removals = select_for_removal(&reference(), &develop_channel());

    assert_eq!(removals.len(), 1);
    assert_eq!(removals[0].version, "1.2.3+1.aaa");
    assert_eq!(removals[0].platform, "linux-64");
    assert_eq!(removals[0].configuration, "np110py27_0");
}

#[test]
fn release_tags_are_never_selected() {
    let removals = select_for_removal(&reference(), &develop_channel());
    assert!(removals.iter().all(|f| f.version != "2.0.0"));
}

#[test]
fn result_is_independent_of_listing_order() {
    let mut reversed = develop_channel();
    reversed.reverse();

    let forward = select_for_removal(&reference(), &develop_channel());
    let backward = select_for_removal(&reference(), &reversed);

    // no dependence on ordering: the same set comes back either way
    assert_eq!(forward.len(), backward.len());
    for f in &forward {
        assert!(backward.contains(f));
    }
}

#[test]
fn rerun_after_purge_selects_nothing() {
    let removals = select_for_removal(&reference(), &develop_channel());
    let remaining: Vec<ArtifactIdentity> = develop_channel()
        .into_iter()
        .filter(|f| !removals.contains(f))
        .collect();

    assert!(select_for_removal(&reference(), &remaining).is_empty());
}

#[test]
fn build_path_and_full_name_identities_agree() {
    let from_listing =
        entry("menpo/pkga/1.2.3+2.bbb/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2");
    assert_eq!(reference(), from_listing);
}
