//! In-memory binstar client for tests
//!
//! Backs the upload/purge paths without a network or an `anaconda` binary.
//! Supports failure injection for exercising error propagation.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactIdentity;
use crate::process::CommandError;

use super::{BinstarClient, BinstarError};

/// Configurable in-memory repository.
#[derive(Default)]
pub struct MockBinstar {
    files: RefCell<Vec<ArtifactIdentity>>,
    uploads: RefCell<Vec<(String, String, PathBuf)>>,
    removed: RefCell<Vec<String>>,
    fail_upload: bool,
}

impl MockBinstar {
    /// A repository pre-populated with channel files.
    pub fn with_files(files: Vec<ArtifactIdentity>) -> Self {
        Self {
            files: RefCell::new(files),
            ..Self::default()
        }
    }

    /// Make every upload fail with a non-zero exit.
    pub fn failing_uploads(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// `(owner, channel, path)` for each accepted upload.
    pub fn uploads(&self) -> Vec<(String, String, PathBuf)> {
        self.uploads.borrow().clone()
    }

    /// Remove specs processed so far.
    pub fn removed(&self) -> Vec<String> {
        self.removed.borrow().clone()
    }

    /// Files still on the repository.
    pub fn remaining(&self) -> Vec<ArtifactIdentity> {
        self.files.borrow().clone()
    }
}

impl BinstarClient for MockBinstar {
    fn list_channel_files(
        &self,
        _owner: &str,
        _channel: &str,
    ) -> Result<Vec<ArtifactIdentity>, BinstarError> {
        Ok(self.files.borrow().clone())
    }

    fn upload(&self, owner: &str, channel: &str, package: &Path) -> Result<(), BinstarError> {
        if self.fail_upload {
            return Err(BinstarError::Command(CommandError::NonZeroExit {
                command: "anaconda -t ***** upload".to_string(),
                code: 1,
            }));
        }
        self.uploads.borrow_mut().push((
            owner.to_string(),
            channel.to_string(),
            package.to_path_buf(),
        ));
        Ok(())
    }

    fn remove(&self, file: &ArtifactIdentity) -> Result<(), BinstarError> {
        self.removed.borrow_mut().push(file.remove_spec());
        self.files.borrow_mut().retain(|f| f != file);
        Ok(())
    }
}
