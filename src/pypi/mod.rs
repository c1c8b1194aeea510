//! PyPI sdist publication
//!
//! Only tagged builds publish to PyPI: release candidates go to the test
//! repository, releases to the real one. To avoid racing uploads across
//! the build matrix, only the designated key node (Linux plus the
//! configured python version) performs the upload.
//!
//! Credentials are written to a transient `~/.pypirc` (two index-server
//! sections) immediately before invoking `twine`; the file is rewritten on
//! every invocation, never merged with existing content.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use globset::Glob;
use thiserror::Error;

use crate::config::CiConfig;
use crate::miniconda::{HostPlatform, Miniconda};
use crate::process::{self, CommandError, CommandSpec};
use crate::version::classify;

#[derive(Debug, Error)]
pub enum PypiError {
    #[error("couldn't find unique path matching glob '{pattern}' - found {}: {found:?}", found.len())]
    WorkDirGlob {
        pattern: String,
        found: Vec<PathBuf>,
    },

    #[error("invalid glob pattern '{0}'")]
    BadPattern(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// PyPI repository names as they appear in `.pypirc`.
const REPO_PYPI: &str = "pypi";
const REPO_PYPI_TEST: &str = "pypitest";

pub fn pypirc_path() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pypirc")
}

/// Write the twine credentials file with both repository sections.
pub fn write_pypirc(
    path: &Path,
    username: &str,
    password: &str,
    test_username: &str,
    test_password: &str,
) -> Result<(), PypiError> {
    let mut f = fs::File::create(path)?;
    writeln!(f, "[distutils]")?;
    writeln!(f, "index-servers =")?;
    writeln!(f, "    {}", REPO_PYPI)?;
    writeln!(f, "    {}", REPO_PYPI_TEST)?;
    writeln!(f)?;
    writeln!(f, "[{}]", REPO_PYPI)?;
    writeln!(f, "repository: https://upload.pypi.org/legacy/")?;
    writeln!(f, "username: {}", username)?;
    writeln!(f, "password: {}", password)?;
    writeln!(f)?;
    writeln!(f, "[{}]", REPO_PYPI_TEST)?;
    writeln!(f, "repository: https://test.pypi.org/legacy/")?;
    writeln!(f, "username: {}", test_username)?;
    writeln!(f, "password: {}", test_password)?;
    Ok(())
}

/// Only the key node uploads sdists: Linux plus the configured version.
pub fn sdist_upload_allowed(cfg: &CiConfig, platform: HostPlatform) -> bool {
    platform == HostPlatform::Linux && cfg.python_version == cfg.pypi_sdist_python_version
}

/// The `work_moved_*` directory conda-build leaves behind under conda-bld.
/// Exactly one is expected after a `--dirty` build following a purge.
pub fn dirty_work_dir(mc: &Miniconda) -> Result<PathBuf, PypiError> {
    unique_path_matching_glob(&mc.conda_bld_dir(), "work_moved_*")
}

fn unique_path_matching_glob(dir: &Path, pattern: &str) -> Result<PathBuf, PypiError> {
    let full_pattern = format!("{}/{}", dir.display(), pattern);
    let matcher = Glob::new(pattern)
        .map_err(|_| PypiError::BadPattern(pattern.to_string()))?
        .compile_matcher();

    let mut matches = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if matcher.is_match(PathBuf::from(entry.file_name())) {
                matches.push(entry.path());
            }
        }
    }

    if matches.len() == 1 {
        Ok(matches.remove(0))
    } else {
        matches.sort();
        Err(PypiError::WorkDirGlob {
            pattern: full_pattern,
            found: matches,
        })
    }
}

/// Upload the sdist for a tagged build, if this node should.
pub fn upload_if_appropriate(
    mc: &Miniconda,
    cfg: &CiConfig,
    version: &str,
) -> Result<Option<&'static str>, PypiError> {
    if cfg.pypi_user.is_none() && cfg.pypi_test_user.is_none() {
        println!("No PyPI username provided");
        return Ok(None);
    }
    if cfg.pypi_password.is_none() && cfg.pypi_test_password.is_none() {
        println!("No PyPI password provided");
        return Ok(None);
    }

    if !sdist_upload_allowed(cfg, HostPlatform::current()) {
        println!(
            "Not on key node (Linux Python {}) - no PyPI sdist upload",
            cfg.pypi_sdist_python_version
        );
        return Ok(None);
    }

    let tags = classify(version);
    let repo = if tags.is_rc_tag {
        println!("RC tag: uploading to test PyPI repository");
        REPO_PYPI_TEST
    } else if tags.is_release_tag {
        println!("Release tag: uploading to main PyPI repository");
        REPO_PYPI
    } else {
        println!("Not release tag or RC tag - no PyPI upload");
        return Ok(None);
    };

    let sdist_glob = dirty_work_dir(mc)?.join("dist").join("*");
    println!("Found build sdist directory: {}", sdist_glob.display());

    println!("Setting up .pypirc file..");
    let config_path = pypirc_path();
    write_pypirc(
        &config_path,
        cfg.pypi_user.as_deref().unwrap_or_default(),
        cfg.pypi_password.as_deref().unwrap_or_default(),
        cfg.pypi_test_user.as_deref().unwrap_or_default(),
        cfg.pypi_test_password.as_deref().unwrap_or_default(),
    )?;

    println!(
        "Uploading to PyPI user '{}'",
        cfg.pypi_user.as_deref().unwrap_or_default()
    );
    // twine expands the glob itself
    let spec = CommandSpec::for_binary(&mc.twine())
        .args(["upload", "-r", repo, "--config-file"])
        .arg(config_path.to_string_lossy().into_owned())
        .arg(sdist_glob.to_string_lossy().into_owned());
    process::execute(&spec)?;

    Ok(Some(repo))
}
