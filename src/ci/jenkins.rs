//! Jenkins environment
//!
//! Multibranch pipeline jobs set `BRANCH_NAME` and, for pull requests,
//! `CHANGE_ID`. Plain git jobs only set `GIT_BRANCH` (possibly prefixed
//! with the remote name, e.g. `origin/master`).

use std::env;

use super::{CiError, CiProvider};

/// Facts captured from a Jenkins build environment.
#[derive(Debug, Clone)]
pub struct Jenkins {
    change_id: Option<String>,
    branch: String,
}

impl Jenkins {
    pub fn from_env() -> Result<Self, CiError> {
        let branch = env::var("BRANCH_NAME")
            .or_else(|_| env::var("GIT_BRANCH"))
            .map_err(|_| CiError::MissingVariable {
                provider: "Jenkins",
                variable: "BRANCH_NAME",
            })?;
        let change_id = env::var("CHANGE_ID").ok();
        Ok(Self::new(change_id, branch))
    }

    pub fn new(change_id: Option<String>, branch: impl Into<String>) -> Self {
        Self {
            change_id,
            branch: branch.into(),
        }
    }
}

impl CiProvider for Jenkins {
    fn name(&self) -> &'static str {
        "Jenkins"
    }

    fn is_pull_request(&self) -> bool {
        self.change_id.is_some()
    }

    fn branch(&self) -> String {
        // GIT_BRANCH carries the remote name; BRANCH_NAME does not
        self.branch
            .strip_prefix("origin/")
            .unwrap_or(&self.branch)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_detection() {
        assert!(!Jenkins::new(None, "master").is_pull_request());
        assert!(Jenkins::new(Some("7".to_string()), "PR-7").is_pull_request());
    }

    #[test]
    fn test_remote_prefix_stripped() {
        assert_eq!(Jenkins::new(None, "origin/develop").branch(), "develop");
        assert_eq!(Jenkins::new(None, "develop").branch(), "develop");
        assert_eq!(Jenkins::new(None, "feature/foo").branch(), "feature/foo");
    }
}
