//! condaci - conda CI build and publication helper
//!
//! Automates building and publishing conda packages from CI: detects the
//! CI provider, provisions a miniconda runtime, runs `conda build`, and
//! conditionally uploads the result to Anaconda.org channels (purging
//! superseded pre-release builds) and, for tagged builds, PyPI.

pub mod artifact;
pub mod binstar;
pub mod build;
pub mod channel;
pub mod ci;
pub mod config;
pub mod miniconda;
pub mod pipeline;
pub mod process;
pub mod pypi;
pub mod summary;
pub mod version;

pub use artifact::{select_for_removal, ArtifactIdentity, IdentityError};
pub use channel::{resolve_upload_channel, MAIN_CHANNEL};
pub use ci::CiProvider;
pub use config::CiConfig;
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
pub use version::{classify, same_version_different_build, VersionTags};
