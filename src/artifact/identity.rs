//! Fixed-schema parsing of artifact names and build paths

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decomposing an artifact name or path.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("artifact name '{0}' does not match the owner/package/version/platform/filename layout")]
    BadFullName(String),

    #[error("package filename '{0}' does not match the name-version-configuration layout")]
    BadFilename(String),

    #[error("package path '{0}' has no platform directory component")]
    NoPlatform(String),
}

/// Identity of a single published (or about-to-be-published) package file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    /// Owning binstar account.
    pub owner: String,
    /// Package name (first dash-field of the filename).
    pub package: String,
    /// Full version string, including any build metadata.
    pub version: String,
    /// Platform directory, e.g. `linux-64`, `win-32`, `osx-64`.
    pub platform: String,
    /// Build configuration, e.g. `np110py27_0`.
    pub configuration: String,
    /// `platform/filename`, as required by the removal API.
    pub basename: String,
}

impl ArtifactIdentity {
    /// Parse a channel listing entry of the form
    /// `owner/package/version/platform/filename`.
    pub fn from_full_name(full_name: &str) -> Result<Self, IdentityError> {
        let normalized = full_name.replace('\\', "/");
        let parts: Vec<&str> = normalized.split('/').collect();
        if parts.len() != 5 || parts.iter().any(|p| p.is_empty()) {
            return Err(IdentityError::BadFullName(full_name.to_string()));
        }
        let configuration = configuration_from_filename(parts[4])?;
        Ok(Self {
            owner: parts[0].to_string(),
            package: parts[1].to_string(),
            version: parts[2].to_string(),
            platform: parts[3].to_string(),
            configuration,
            basename: format!("{}/{}", parts[3], parts[4]),
        })
    }

    /// Parse a built package path from the conda-bld tree, e.g.
    /// `.../conda-bld/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2`.
    ///
    /// The platform is the parent directory; the owner is supplied by the
    /// caller since a local path carries no account information.
    pub fn from_build_path(path: &Path, owner: &str) -> Result<Self, IdentityError> {
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| IdentityError::NoPlatform(path.display().to_string()))?;
        let platform = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|f| f.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IdentityError::NoPlatform(path.display().to_string()))?;

        let fields: Vec<&str> = filename.split('-').collect();
        if fields.len() != 3 {
            return Err(IdentityError::BadFilename(filename.to_string()));
        }
        let configuration = configuration_from_filename(filename)?;

        Ok(Self {
            owner: owner.to_string(),
            package: fields[0].to_string(),
            version: fields[1].to_string(),
            platform: platform.to_string(),
            configuration,
            basename: format!("{}/{}", platform, filename),
        })
    }

    /// Spec string accepted by the removal API:
    /// `owner/package/version/platform/filename`.
    pub fn remove_spec(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.owner, self.package, self.version, self.basename
        )
    }
}

impl std::fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.owner, self.package, self.version, self.basename
        )
    }
}

/// Third dash-field of the filename, up to the first dot:
/// `pkga-1.2.3-np110py27_0.tar.bz2` -> `np110py27_0`.
fn configuration_from_filename(filename: &str) -> Result<String, IdentityError> {
    let fields: Vec<&str> = filename.split('-').collect();
    if fields.len() != 3 {
        return Err(IdentityError::BadFilename(filename.to_string()));
    }
    let configuration = fields[2]
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IdentityError::BadFilename(filename.to_string()))?;
    Ok(configuration.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_full_name() {
        let id = ArtifactIdentity::from_full_name(
            "menpo/pkga/1.2.3+2.bbb/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2",
        )
        .unwrap();

        assert_eq!(id.owner, "menpo");
        assert_eq!(id.package, "pkga");
        assert_eq!(id.version, "1.2.3+2.bbb");
        assert_eq!(id.platform, "linux-64");
        assert_eq!(id.configuration, "np110py27_0");
        assert_eq!(
            id.basename,
            "linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2"
        );
    }

    #[test]
    fn test_from_full_name_backslashes_normalized() {
        let id = ArtifactIdentity::from_full_name(
            r"menpo\pkga\1.2.3\win-64\pkga-1.2.3-np110py35_0.tar.bz2",
        )
        .unwrap();
        assert_eq!(id.platform, "win-64");
    }

    #[test]
    fn test_from_full_name_wrong_arity() {
        let err = ArtifactIdentity::from_full_name("menpo/pkga/1.2.3").unwrap_err();
        assert!(matches!(err, IdentityError::BadFullName(_)));
    }

    #[test]
    fn test_from_full_name_bad_filename() {
        let err =
            ArtifactIdentity::from_full_name("menpo/pkga/1.2.3/linux-64/nodashes.tar.bz2")
                .unwrap_err();
        assert!(matches!(err, IdentityError::BadFilename(_)));
    }

    #[test]
    fn test_from_build_path() {
        let path =
            PathBuf::from("/home/ci/miniconda/conda-bld/linux-64/pkga-1.2.3+2.bbb-np110py27_0.tar.bz2");
        let id = ArtifactIdentity::from_build_path(&path, "menpo").unwrap();

        assert_eq!(id.owner, "menpo");
        assert_eq!(id.package, "pkga");
        assert_eq!(id.version, "1.2.3+2.bbb");
        assert_eq!(id.platform, "linux-64");
        assert_eq!(id.configuration, "np110py27_0");
    }

    #[test]
    fn test_from_build_path_bad_filename() {
        let path = PathBuf::from("/bld/linux-64/too-many-dash-fields-1.2.3.tar.bz2");
        let err = ArtifactIdentity::from_build_path(&path, "menpo").unwrap_err();
        assert!(matches!(err, IdentityError::BadFilename(_)));
    }

    #[test]
    fn test_remove_spec() {
        let id = ArtifactIdentity::from_full_name(
            "menpo/pkga/1.2.3/linux-64/pkga-1.2.3-np110py27_0.tar.bz2",
        )
        .unwrap();
        assert_eq!(
            id.remove_spec(),
            "menpo/pkga/1.2.3/linux-64/pkga-1.2.3-np110py27_0.tar.bz2"
        );
    }
}
