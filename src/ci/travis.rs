//! Travis CI environment

use std::env;

use super::{CiError, CiProvider};

/// Facts captured from a Travis build environment.
///
/// Travis reports `TRAVIS_PULL_REQUEST` as a PR number or the literal
/// string `false`, and sets `TRAVIS_TAG` to the empty string for
/// non-tag builds.
#[derive(Debug, Clone)]
pub struct Travis {
    pull_request: String,
    branch: String,
    tag: String,
}

impl Travis {
    pub fn from_env() -> Result<Self, CiError> {
        let pull_request =
            env::var("TRAVIS_PULL_REQUEST").map_err(|_| CiError::MissingVariable {
                provider: "Travis",
                variable: "TRAVIS_PULL_REQUEST",
            })?;
        let branch = env::var("TRAVIS_BRANCH").map_err(|_| CiError::MissingVariable {
            provider: "Travis",
            variable: "TRAVIS_BRANCH",
        })?;
        let tag = env::var("TRAVIS_TAG").unwrap_or_default();
        Ok(Self::new(pull_request, branch, tag))
    }

    pub fn new(
        pull_request: impl Into<String>,
        branch: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            pull_request: pull_request.into(),
            branch: branch.into(),
            tag: tag.into(),
        }
    }

    fn tag_obscures_branch(&self) -> bool {
        !self.tag.is_empty() && self.tag == self.branch
    }
}

impl CiProvider for Travis {
    fn name(&self) -> &'static str {
        "Travis"
    }

    fn is_pull_request(&self) -> bool {
        self.pull_request != "false"
    }

    fn branch(&self) -> String {
        if self.tag_obscures_branch() {
            // On a tag build Travis sets TRAVIS_BRANCH to the tag itself,
            // obscuring the real branch. Assume master.
            println!(
                "WARNING - TRAVIS_TAG == TRAVIS_BRANCH ('{}'). This suggests a tag build.",
                self.tag
            );
            println!("Travis obscures the branch here, so the branch is assumed to be 'master'");
            "master".to_string()
        } else {
            self.branch.clone()
        }
    }

    fn build_is_duplicate(&self) -> bool {
        // Travis starts two builds for a pushed tag: one for the tag and
        // one for the branch carrying it. Doing the work twice breaks
        // uploads, so the second one is detected and skipped.
        self.tag_obscures_branch()
    }
}
