//! Invocation configuration
//!
//! All environment input is read exactly once, up front, into an immutable
//! [`CiConfig`] that is passed by parameter everywhere it is needed. Deep
//! logic never reads the ambient environment.
//!
//! Secret values (`BINSTAR_KEY`, PyPI passwords) are additionally scrubbed
//! from the process environment before the build subprocess is spawned, so
//! that a chatty build toolchain cannot divulge them.

use std::env;

use thiserror::Error;

use crate::process::MASK;

/// Python versions the conda toolchain setup supports.
pub const SUPPORTED_PYTHON_VERSIONS: &[&str] = &["2.7", "3.3", "3.4", "3.5", "3.6", "3.7"];

/// Environment variables that must never leak into subprocess environments
/// or error output.
pub const SECRET_ENV_KEYS: &[&str] = &["BINSTAR_KEY", "PYPI_PASSWORD", "PYPI_TEST_PASSWORD"];

/// Where the architecture value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchOrigin {
    /// `ARCH` or `PLATFORM` environment variable.
    Environment,
    /// Predicted from the host pointer width (Jenkins sets no arch variable).
    PointerWidth,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PYTHON_VERSION is not set")]
    MissingPythonVersion,

    #[error("PYTHON_VERSION '{0}' is invalid - must be one of {SUPPORTED_PYTHON_VERSIONS:?}")]
    UnsupportedPythonVersion(String),
}

/// Immutable per-invocation configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct CiConfig {
    /// Dotted python version, e.g. `3.6`.
    pub python_version: String,
    /// Dotless form for `CONDA_PY` / `--py`, e.g. `36`.
    pub python_version_no_dot: String,
    /// `x64` or `x86`.
    pub arch: String,
    pub arch_origin: ArchOrigin,
    pub binstar_user: Option<String>,
    pub binstar_key: Option<String>,
    pub pypi_user: Option<String>,
    pub pypi_password: Option<String>,
    pub pypi_test_user: Option<String>,
    pub pypi_test_password: Option<String>,
    /// The single python version allowed to upload sdists (the "key node").
    pub pypi_sdist_python_version: String,
}

impl CiConfig {
    /// Read and validate the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let python_version = env::var("PYTHON_VERSION")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingPythonVersion)?;
        if !SUPPORTED_PYTHON_VERSIONS.contains(&python_version.as_str()) {
            return Err(ConfigError::UnsupportedPythonVersion(python_version));
        }
        let python_version_no_dot = python_version.replace('.', "");

        // ARCH preferred; AppVeyor calls it PLATFORM; Jenkins sets neither
        let (arch, arch_origin) = match env::var("ARCH").or_else(|_| env::var("PLATFORM")) {
            Ok(arch) if !arch.is_empty() => (arch, ArchOrigin::Environment),
            _ => (predicted_arch().to_string(), ArchOrigin::PointerWidth),
        };

        Ok(Self {
            python_version,
            python_version_no_dot,
            arch,
            arch_origin,
            binstar_user: non_empty_var("BINSTAR_USER"),
            binstar_key: non_empty_var("BINSTAR_KEY"),
            pypi_user: non_empty_var("PYPI_USER"),
            pypi_password: non_empty_var("PYPI_PASSWORD"),
            pypi_test_user: non_empty_var("PYPI_TEST_USER"),
            pypi_test_password: non_empty_var("PYPI_TEST_PASSWORD"),
            pypi_sdist_python_version: env::var("CONDACI_PYPI_SDIST_UPLOAD_PY_VER")
                .unwrap_or_else(|_| "3.5".to_string()),
        })
    }

    /// Echo the extracted values to the CI console, secrets masked.
    pub fn print_summary(&self) {
        let origin = match self.arch_origin {
            ArchOrigin::Environment => "Environment",
            ArchOrigin::PointerWidth => "Predicted",
        };
        println!("Environment variables extracted:");
        println!("  PYTHON_VERSION:     {}", self.python_version);
        println!("  ARCH:               {} - ({})", self.arch, origin);
        println!("  BINSTAR_USER:       {}", display_plain(&self.binstar_user));
        println!("  BINSTAR_KEY:        {}", display_masked(&self.binstar_key));
        println!("  PYPI_USER:          {}", display_plain(&self.pypi_user));
        println!("  PYPI_PASSWORD:      {}", display_masked(&self.pypi_password));
        println!("  PYPI_TEST_USER:     {}", display_plain(&self.pypi_test_user));
        println!(
            "  PYPI_TEST_PASSWORD: {}",
            display_masked(&self.pypi_test_password)
        );
    }

    pub fn has_binstar_credentials(&self) -> bool {
        self.binstar_user.is_some() && self.binstar_key.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn predicted_arch() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "x64"
    } else {
        "x86"
    }
}

fn display_plain(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn display_masked(value: &Option<String>) -> &'static str {
    if value.is_some() {
        MASK
    } else {
        "-"
    }
}

/// Delete secret variables from the process environment.
///
/// Must run before the build subprocess is spawned: the windows compiler
/// setup in particular echoes its whole environment on failure.
pub fn scrub_secret_env() {
    for key in SECRET_ENV_KEYS {
        if env::var_os(key).is_some() {
            println!("found {} in environment - deleting so subprocesses cannot divulge it", key);
            env::remove_var(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_versions() {
        assert!(SUPPORTED_PYTHON_VERSIONS.contains(&"2.7"));
        assert!(SUPPORTED_PYTHON_VERSIONS.contains(&"3.6"));
        assert!(!SUPPORTED_PYTHON_VERSIONS.contains(&"3.12"));
    }

    #[test]
    fn test_display_masked_never_shows_value() {
        assert_eq!(display_masked(&Some("hunter2".to_string())), MASK);
        assert_eq!(display_masked(&None), "-");
    }

    #[test]
    fn test_predicted_arch_is_valid() {
        assert!(["x64", "x86"].contains(&predicted_arch()));
    }
}
