//! Binstar (Anaconda.org) publication
//!
//! Uploads built packages and purges superseded pre-release builds from the
//! target channel. All remote operations go through the [`BinstarClient`]
//! seam; the production implementation shells out to the `anaconda` CLI
//! from the miniconda install, with the upload token masked in every
//! surfaced command line.

pub mod mock;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::{select_for_removal, ArtifactIdentity, IdentityError};
use crate::channel::{resolve_upload_channel, MAIN_CHANNEL};
use crate::ci::CiProvider;
use crate::config::CiConfig;
use crate::miniconda::Miniconda;
use crate::process::{self, CommandError, CommandSpec};

#[derive(Debug, Error)]
pub enum BinstarError {
    #[error("built file {0} does not exist - upload failed")]
    MissingArtifact(PathBuf),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Remote operations against an artifact repository.
pub trait BinstarClient {
    /// Files currently published on `owner`'s `channel`.
    fn list_channel_files(
        &self,
        owner: &str,
        channel: &str,
    ) -> Result<Vec<ArtifactIdentity>, BinstarError>;

    /// Upload a package file to a channel.
    fn upload(&self, owner: &str, channel: &str, package: &Path) -> Result<(), BinstarError>;

    /// Remove a published file.
    fn remove(&self, file: &ArtifactIdentity) -> Result<(), BinstarError>;
}

/// `anaconda` CLI from the miniconda install, authenticated with a token.
pub struct AnacondaCli {
    binary: PathBuf,
    token: String,
}

impl AnacondaCli {
    pub fn new(mc: &Miniconda, token: impl Into<String>) -> Self {
        Self {
            binary: mc.anaconda(),
            token: token.into(),
        }
    }

    fn base(&self) -> CommandSpec {
        CommandSpec::for_binary(&self.binary)
            .arg("-t")
            .secret_arg(self.token.clone())
    }
}

impl BinstarClient for AnacondaCli {
    fn list_channel_files(
        &self,
        owner: &str,
        channel: &str,
    ) -> Result<Vec<ArtifactIdentity>, BinstarError> {
        // one full name per line: owner/package/version/platform/filename
        let spec = self
            .base()
            .args(["channel", "--organization"])
            .arg(owner)
            .arg("--list-files")
            .arg(channel);
        let output = process::capture(&spec)?;
        let mut files = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            files.push(ArtifactIdentity::from_full_name(line)?);
        }
        Ok(files)
    }

    fn upload(&self, owner: &str, channel: &str, package: &Path) -> Result<(), BinstarError> {
        let spec = self
            .base()
            .args(["upload", "--force", "-u"])
            .arg(owner)
            .arg("-c")
            .arg(channel)
            .arg(package.to_string_lossy().into_owned());
        process::execute(&spec)?;
        Ok(())
    }

    fn remove(&self, file: &ArtifactIdentity) -> Result<(), BinstarError> {
        let spec = self.base().args(["remove", "--force"]).arg(file.remove_spec());
        process::execute(&spec)?;
        Ok(())
    }
}

/// Upload the built package if this build is allowed to publish.
///
/// Missing credentials and pull-request builds skip the upload with a
/// console message; neither is an error. The PR short-circuit applies
/// before and independently of channel resolution.
pub fn upload_if_appropriate(
    client: &dyn BinstarClient,
    cfg: &CiConfig,
    provider: &dyn CiProvider,
    version: &str,
    package_path: &Path,
) -> Result<Option<UploadReport>, BinstarError> {
    if cfg.binstar_key.is_none() {
        println!("No binstar key provided");
    }
    if cfg.binstar_user.is_none() {
        println!("No binstar user provided");
    }
    let Some(user) = cfg.binstar_user.as_deref() else {
        println!("-> Unable to upload to binstar");
        return Ok(None);
    };
    if cfg.binstar_key.is_none() {
        println!("-> Unable to upload to binstar");
        return Ok(None);
    }
    println!("Have a user ({}) and key - can upload if suitable", user);

    if provider.is_pull_request() {
        println!("Cannot upload to binstar - must be a PR.");
        return Ok(None);
    }

    println!("Auto resolving channel based on release type and CI status");
    let channel = resolve_upload_channel(version, &provider.branch());
    println!("Fit to upload to channel '{}'", channel);

    let purged = upload_and_purge(client, user, &channel, package_path)?;
    Ok(Some(UploadReport { channel, purged }))
}

/// What an upload actually did, for the run summary.
#[derive(Debug)]
pub struct UploadReport {
    pub channel: String,
    pub purged: Vec<String>,
}

/// Upload `package_path` to `owner/channel`, then purge superseded
/// pre-release builds - unless the channel is `main`, which is never
/// purged.
pub fn upload_and_purge(
    client: &dyn BinstarClient,
    owner: &str,
    channel: &str,
    package_path: &Path,
) -> Result<Vec<String>, BinstarError> {
    if !package_path.exists() {
        return Err(BinstarError::MissingArtifact(package_path.to_path_buf()));
    }

    println!("Uploading to {}/{}", owner, channel);
    client.upload(owner, channel, package_path)?;

    if channel == MAIN_CHANNEL {
        println!("On main channel - no purging of releases will be done.");
        return Ok(Vec::new());
    }

    println!("Purging old releases from channel '{}'", channel);
    let reference = ArtifactIdentity::from_build_path(package_path, owner)?;
    purge_stale_files(client, owner, channel, &reference)
}

/// Remove channel files superseded by `reference`. Returns the removed
/// full names.
pub fn purge_stale_files(
    client: &dyn BinstarClient,
    owner: &str,
    channel: &str,
    reference: &ArtifactIdentity,
) -> Result<Vec<String>, BinstarError> {
    let channel_files = client.list_channel_files(owner, channel)?;
    println!(
        "Removing old releases matching:\nname: {}\nconfiguration: {}\nplatform: {}\nversion: {}",
        reference.package, reference.configuration, reference.platform, reference.version
    );

    let to_remove = select_for_removal(reference, &channel_files);
    println!("Found {} releases to remove", to_remove.len());

    let mut removed = Vec::with_capacity(to_remove.len());
    for file in &to_remove {
        println!("Removing '{}'", file);
        client.remove(file)?;
        removed.push(file.to_string());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::mock::MockBinstar;
    use super::*;

    fn channel_file(version: &str) -> ArtifactIdentity {
        ArtifactIdentity::from_full_name(&format!(
            "menpo/pkga/{v}/linux-64/pkga-{v}-np110py27_0.tar.bz2",
            v = version
        ))
        .unwrap()
    }

    #[test]
    fn test_purge_removes_superseded_builds_only() {
        let client = MockBinstar::with_files(vec![
            channel_file("1.2.3+1.aaa"),
            channel_file("1.2.3+2.bbb"),
            channel_file("2.0.0"),
        ]);
        let reference = channel_file("1.2.3+2.bbb");

        let removed = purge_stale_files(&client, "menpo", "develop", &reference).unwrap();

        assert_eq!(removed.len(), 1);
        assert!(removed[0].contains("1.2.3+1.aaa"));
        assert_eq!(client.removed().len(), 1);
    }

    #[test]
    fn test_upload_and_purge_missing_file() {
        let client = MockBinstar::default();
        let err = upload_and_purge(
            &client,
            "menpo",
            "develop",
            Path::new("/nonexistent/pkga-1.2.3-np110py27_0.tar.bz2"),
        )
        .unwrap_err();
        assert!(matches!(err, BinstarError::MissingArtifact(_)));
        assert!(client.uploads().is_empty());
    }
}
