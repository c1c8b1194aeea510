//! CI provider detection and normalization
//!
//! Each supported provider exposes pull-request, branch, and tag facts
//! through different environment variables. The environment is probed once
//! at startup by [`detect`]; after that every fact comes from the captured
//! provider value, never from ad hoc environment reads.

mod appveyor;
mod jenkins;
mod travis;

use std::env;

use thiserror::Error;

pub use appveyor::AppVeyor;
pub use jenkins::Jenkins;
pub use travis::Travis;

/// Errors from probing the CI environment.
#[derive(Debug, Error)]
pub enum CiError {
    #[error("unknown CI system - expected Travis, AppVeyor, or Jenkins")]
    UnknownProvider,

    #[error("{provider} did not set required variable {variable}")]
    MissingVariable {
        provider: &'static str,
        variable: &'static str,
    },
}

/// Normalized view of a CI execution context.
///
/// Implementations capture their environment at construction; the methods
/// are pure functions of that snapshot.
pub trait CiProvider {
    /// Provider name for operator-facing messages.
    fn name(&self) -> &'static str;

    /// True when this build was triggered by a pull request.
    fn is_pull_request(&self) -> bool;

    /// The branch this build should publish to, after provider-specific
    /// disambiguation.
    fn branch(&self) -> String;

    /// True when the provider has kicked off a second build for the same
    /// commit (tag builds on some providers double up with branch builds).
    fn build_is_duplicate(&self) -> bool {
        false
    }
}

/// Probe the environment and return the active provider.
pub fn detect() -> Result<Box<dyn CiProvider>, CiError> {
    if env::var_os("TRAVIS").is_some() {
        Ok(Box::new(Travis::from_env()?))
    } else if env::var_os("APPVEYOR").is_some() {
        Ok(Box::new(AppVeyor::from_env()?))
    } else if env::var_os("JENKINS_URL").is_some() {
        Ok(Box::new(Jenkins::from_env()?))
    } else {
        Err(CiError::UnknownProvider)
    }
}
