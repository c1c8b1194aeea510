//! AppVeyor environment

use std::env;

use super::{CiError, CiProvider};

/// Facts captured from an AppVeyor build environment.
#[derive(Debug, Clone)]
pub struct AppVeyor {
    pull_request_number: Option<String>,
    branch: String,
}

impl AppVeyor {
    pub fn from_env() -> Result<Self, CiError> {
        let branch = env::var("APPVEYOR_REPO_BRANCH").map_err(|_| CiError::MissingVariable {
            provider: "AppVeyor",
            variable: "APPVEYOR_REPO_BRANCH",
        })?;
        let pull_request_number = env::var("APPVEYOR_PULL_REQUEST_NUMBER").ok();
        Ok(Self::new(pull_request_number, branch))
    }

    pub fn new(pull_request_number: Option<String>, branch: impl Into<String>) -> Self {
        Self {
            pull_request_number,
            branch: branch.into(),
        }
    }
}

impl CiProvider for AppVeyor {
    fn name(&self) -> &'static str {
        "AppVeyor"
    }

    fn is_pull_request(&self) -> bool {
        self.pull_request_number.is_some()
    }

    fn branch(&self) -> String {
        self.branch.clone()
    }
}
