//! Conda package build
//!
//! Wraps `conda build` for a recipe directory: exports the version and
//! python selection to the recipe, wires the master channel in for
//! non-release builds, scrubs secrets from the environment, and purges
//! conda caches so the build tree can be located unambiguously afterwards.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ci::CiProvider;
use crate::config::{self, CiConfig};
use crate::miniconda::Miniconda;
use crate::process::{self, CommandError, CommandSpec};
use crate::version::{classify, detect_version, VersionError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("conda build reported no output path for recipe '{0}'")]
    NoOutputPath(String),
}

/// What the build step produced.
#[derive(Debug)]
pub enum BuildOutcome {
    /// Package built; path comes from `conda build --output`.
    Built { version: String, package_path: PathBuf },
    /// The provider already has another build running for this commit.
    /// Intentional no-op, not an error.
    DuplicateBuild { version: String },
}

/// Build the conda package described by `recipe_dir`.
pub fn build_package(
    mc: &Miniconda,
    cfg: &CiConfig,
    provider: &dyn CiProvider,
    recipe_dir: &Path,
) -> Result<BuildOutcome, BuildError> {
    println!("Building package at path {}", recipe_dir.display());
    println!(
        "Setting CONDA_PY environment variable to {}",
        cfg.python_version_no_dot
    );

    let source_root = recipe_dir.parent().unwrap_or(recipe_dir);
    let version = detect_version(&mc.python(), source_root, recipe_dir)?;
    println!("Detected version: {}", version);

    let tags = classify(&version);
    if !(tags.is_release_tag || tags.is_rc_tag) {
        // dev builds source their in-progress dependencies from master
        println!("building a non-release non-RC build - adding master channel.");
        match cfg.binstar_user.as_deref() {
            Some(user) => {
                let spec = CommandSpec::for_binary(&mc.conda())
                    .args(["config", "--system", "--add", "channels"])
                    .arg(format!("{}/channel/master", user));
                process::execute(&spec)?;
            }
            None => println!("warning - no binstar user provided - cannot add master channel"),
        }
    } else {
        println!("building a RC or tag release - no master channel added.");
        println!("Checking to see if this build is a duplicate...");
        if provider.build_is_duplicate() {
            println!(
                "On {} and this is a duplicate build of a tag - another build \
                 for the branch carrying this tag is already running.",
                provider.name()
            );
            println!("Exiting this build now.");
            return Ok(BuildOutcome::DuplicateBuild { version });
        }
    }

    config::scrub_secret_env();

    // Purge the conda-bld dir and caches so the work dir left behind by
    // this build can be located unambiguously afterwards.
    process::execute(&CommandSpec::for_binary(&mc.conda()).args(["build", "purge-all"]))?;
    process::execute(&CommandSpec::for_binary(&mc.conda()).args(["clean", "--all", "--yes"]))?;

    let recipe = recipe_dir.to_string_lossy().into_owned();
    let build_spec = CommandSpec::for_binary(&mc.conda())
        .args(["build", "-q"])
        .arg(recipe.clone())
        .arg(format!("--py={}", cfg.python_version_no_dot))
        .args(["--dirty", "--no-build-id"])
        .env("CONDA_PY", cfg.python_version_no_dot.clone())
        .env("CONDACI_VERSION", version.clone());
    process::execute(&build_spec)?;

    let package_path = built_package_path(mc, cfg, recipe_dir, &version)?;
    println!("built package is at {}", package_path.display());

    Ok(BuildOutcome::Built {
        version,
        package_path,
    })
}

/// Ask conda where the build landed.
pub fn built_package_path(
    mc: &Miniconda,
    cfg: &CiConfig,
    recipe_dir: &Path,
    version: &str,
) -> Result<PathBuf, BuildError> {
    let spec = CommandSpec::for_binary(&mc.conda())
        .args(["build", "--output"])
        .arg(recipe_dir.to_string_lossy().into_owned())
        .arg(format!("--py={}", cfg.python_version_no_dot))
        .env("CONDA_PY", cfg.python_version_no_dot.clone())
        .env("CONDACI_VERSION", version.to_string());
    let output = process::capture(&spec)?;
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| BuildError::NoOutputPath(recipe_dir.display().to_string()))
}
