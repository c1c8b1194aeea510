//! Published artifact identity and retention
//!
//! An artifact on a binstar channel is identified by the fixed-layout name
//! `owner/package/version/platform/filename`; a freshly built package is
//! identified by its path inside the conda-bld tree. Both decompose into the
//! same [`ArtifactIdentity`]. Inputs that do not match the expected arity
//! are an [`IdentityError`], never silently tolerated.

mod identity;
mod retention;

pub use identity::{ArtifactIdentity, IdentityError};
pub use retention::select_for_removal;
