//! Invocation orchestration
//!
//! Wires the per-invocation context together: configuration read once from
//! the environment, the CI provider probed once, and the miniconda install
//! location resolved for that provider. Each CLI subcommand is a method on
//! [`Pipeline`]; everything runs sequentially, errors are fatal, and the
//! only intentional early exit is the duplicate-build no-op.

use std::io;
use std::path::Path;

use thiserror::Error;
use ulid::Ulid;

use crate::binstar::{self, AnacondaCli, BinstarError};
use crate::build::{self, BuildError, BuildOutcome};
use crate::ci::{self, CiError, CiProvider};
use crate::config::{CiConfig, ConfigError};
use crate::miniconda::{self, HostPlatform, Miniconda, MinicondaError};
use crate::pypi::{self, PypiError};
use crate::summary::RunSummary;
use crate::version::{detect_version, VersionError};

/// Top-level pipeline errors with stable exit codes.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CI detection error: {0}")]
    Ci(#[from] CiError),

    #[error("miniconda setup error: {0}")]
    Miniconda(#[from] MinicondaError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("binstar error: {0}")]
    Binstar(#[from] BinstarError),

    #[error("PyPI error: {0}")]
    Pypi(#[from] PypiError),

    #[error("version error: {0}")]
    Version(#[from] VersionError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// Exit code surfaced to the CI platform.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Ci(_) => 3,
            PipelineError::Miniconda(_) => 10,
            PipelineError::Build(_) => 20,
            PipelineError::Version(_) => 21,
            PipelineError::Binstar(_) => 30,
            PipelineError::Pypi(_) => 40,
            PipelineError::Io(_) => 1,
        }
    }
}

/// How an invocation ended, for the process exit code.
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    /// Duplicate CI-triggered build; exits 0 without doing the work.
    DuplicateBuild,
}

/// Per-invocation context.
pub struct Pipeline {
    run_id: Ulid,
    cfg: CiConfig,
    provider: Box<dyn CiProvider>,
    mc: Miniconda,
}

impl Pipeline {
    /// Probe the environment once and build the full context.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_env_quiet(false)
    }

    /// As [`Pipeline::from_env`], optionally suppressing the config echo
    /// (used by `miniconda-dir`, whose stdout is consumed by scripts).
    pub fn from_env_quiet(quiet: bool) -> Result<Self, PipelineError> {
        let provider = ci::detect()?;
        let cfg = CiConfig::from_env()?;
        if !quiet {
            println!("Detected CI provider: {}", provider.name());
            cfg.print_summary();
        }
        let root = miniconda::install_dir(provider.name(), &cfg.arch);
        let mc = Miniconda::new(root, HostPlatform::current());
        Ok(Self {
            run_id: Ulid::new(),
            cfg,
            provider,
            mc,
        })
    }

    pub fn miniconda(&self) -> &Miniconda {
        &self.mc
    }

    /// `setup` subcommand: provision miniconda and configure channels.
    pub fn setup(&self, extra_channels: &[String]) -> Result<(), PipelineError> {
        miniconda::setup(
            &self.mc,
            &self.cfg.arch,
            self.cfg.binstar_user.as_deref(),
            extra_channels,
        )?;
        Ok(())
    }

    /// `version` subcommand: print the detected package version.
    pub fn print_version(&self, recipe_dir: &Path) -> Result<(), PipelineError> {
        let source_root = recipe_dir.parent().unwrap_or(recipe_dir);
        let version = detect_version(&self.mc.python(), source_root, recipe_dir)?;
        println!("{}", version);
        Ok(())
    }

    /// `build` subcommand: build, then conditionally publish to binstar
    /// and PyPI, then write the run summary.
    pub fn build(&self, recipe_dir: &Path) -> Result<PipelineOutcome, PipelineError> {
        println!("condaci run {}", self.run_id);
        let mut summary = RunSummary::new(
            self.run_id.to_string(),
            self.provider.name(),
            self.provider.is_pull_request(),
        );

        let outcome = build::build_package(&self.mc, &self.cfg, self.provider.as_ref(), recipe_dir)?;

        let (version, package_path) = match outcome {
            BuildOutcome::DuplicateBuild { version } => {
                summary.version = Some(version);
                summary.duplicate_build = true;
                self.write_summary(&summary);
                return Ok(PipelineOutcome::DuplicateBuild);
            }
            BuildOutcome::Built {
                version,
                package_path,
            } => (version, package_path),
        };
        println!("successfully built conda package, proceeding to upload");
        summary.version = Some(version.clone());

        // secrets were scrubbed from the process env before the build
        // subprocess spawned; the captured config still holds them
        if let Some(key) = self.cfg.binstar_key.as_deref() {
            let client = AnacondaCli::new(&self.mc, key);
            if let Some(report) = binstar::upload_if_appropriate(
                &client,
                &self.cfg,
                self.provider.as_ref(),
                &version,
                &package_path,
            )? {
                summary.uploaded = true;
                summary.channel = Some(report.channel);
                summary.purged = report.purged;
            }
        } else {
            println!("No binstar key provided");
            println!("-> Unable to upload to binstar");
        }

        summary.pypi_repository = pypi::upload_if_appropriate(&self.mc, &self.cfg, &version)?
            .map(str::to_string);

        self.write_summary(&summary);
        Ok(PipelineOutcome::Completed)
    }

    fn write_summary(&self, summary: &RunSummary) {
        let dir = self.mc.conda_bld_dir();
        let path = if dir.exists() {
            dir.join("condaci_summary.json")
        } else {
            std::env::temp_dir().join("condaci_summary.json")
        };
        match summary.write_to_file(&path) {
            Ok(()) => println!("run summary written to {}", path.display()),
            Err(e) => eprintln!("warning: could not write run summary: {}", e),
        }
    }
}
