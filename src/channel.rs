//! Release-channel resolution
//!
//! Tagged releases always publish to `main`; everything else publishes to
//! the channel named after the CI branch, so in-progress work accumulates
//! on per-branch channels that downstream consumers can opt into.

use crate::version::classify;

/// The distinguished channel. Never purged.
pub const MAIN_CHANNEL: &str = "main";

/// Resolve the channel a build's artifact should publish to.
///
/// `branch` is the provider-normalized branch name; provider-specific
/// disambiguation (e.g. Travis tag/branch aliasing) happens before this
/// function runs.
pub fn resolve_upload_channel(version: &str, branch: &str) -> String {
    if classify(version).is_release_tag {
        println!(
            "current head is a tagged release ({}), uploading to '{}' channel",
            version, MAIN_CHANNEL
        );
        MAIN_CHANNEL.to_string()
    } else {
        println!("current head is not a release - channel follows the CI branch");
        branch.to_string()
    }
}
