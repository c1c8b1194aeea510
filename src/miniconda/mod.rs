//! Miniconda provisioning
//!
//! Downloads and installs Miniconda3 when no install is present (a plain
//! filesystem existence check on the `conda` binary keeps this idempotent),
//! then installs the build/upload toolbelt and configures dependency
//! channels. All the binaries the rest of the pipeline invokes (`conda`,
//! `python`, `twine`, `anaconda`) are resolved through [`Miniconda`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::process::{self, CommandError, CommandSpec};

/// Host operating system, as far as the installer cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    MacOs,
    Windows,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else {
            HostPlatform::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == HostPlatform::Windows
    }
}

#[derive(Debug, Error)]
pub enum MinicondaError {
    #[error("unsupported architecture '{0}' - expected x64 or x86")]
    UnsupportedArch(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Installer URL for the latest Miniconda3 on the given platform/arch.
pub fn installer_url(platform: HostPlatform, arch: &str) -> Result<String, MinicondaError> {
    let platform_str = match platform {
        HostPlatform::Linux => "Linux",
        HostPlatform::MacOs => "MacOSX",
        HostPlatform::Windows => "Windows",
    };
    let arch_str = match arch {
        "x64" => "x86_64",
        "x86" => "x86",
        other => return Err(MinicondaError::UnsupportedArch(other.to_string())),
    };
    let ext = if platform.is_windows() { ".exe" } else { ".sh" };
    Ok(format!(
        "https://repo.continuum.io/miniconda/Miniconda3-latest-{}-{}{}",
        platform_str, arch_str, ext
    ))
}

/// Where miniconda is (or will be) installed for the current provider.
///
/// AppVeyor images ship preinstalled Miniconda trees at fixed paths;
/// everywhere else a fresh install under the home directory is used.
pub fn install_dir(provider_name: &str, arch: &str) -> PathBuf {
    if provider_name == "AppVeyor" {
        let mut dir = String::from(r"C:\Miniconda36");
        if arch == "x64" {
            dir.push_str("-x64");
        }
        PathBuf::from(dir)
    } else {
        home_dir().join("miniconda")
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// A temp path for the downloaded installer. Random filename to avoid
/// collisions between concurrent CI jobs on shared workers.
pub fn temp_installer_path(platform: HostPlatform) -> PathBuf {
    let id = Uuid::new_v4();
    if platform.is_windows() {
        PathBuf::from(format!(r"C:\{}.exe", id))
    } else {
        home_dir().join(format!("{}.sh", id))
    }
}

/// Handle to a miniconda install tree.
#[derive(Debug, Clone)]
pub struct Miniconda {
    root: PathBuf,
    platform: HostPlatform,
}

impl Miniconda {
    pub fn new(root: PathBuf, platform: HostPlatform) -> Self {
        Self { root, platform }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `Scripts` on windows, `bin` elsewhere.
    pub fn script_dir(&self) -> PathBuf {
        let name = if self.platform.is_windows() {
            "Scripts"
        } else {
            "bin"
        };
        self.root.join(name)
    }

    pub fn conda_bld_dir(&self) -> PathBuf {
        self.root.join("conda-bld")
    }

    fn binary(&self, name: &str) -> PathBuf {
        let filename = if self.platform.is_windows() {
            format!("{}.exe", name)
        } else {
            name.to_string()
        };
        self.script_dir().join(filename)
    }

    pub fn conda(&self) -> PathBuf {
        self.binary("conda")
    }

    pub fn python(&self) -> PathBuf {
        self.binary("python")
    }

    pub fn twine(&self) -> PathBuf {
        self.binary("twine")
    }

    pub fn anaconda(&self) -> PathBuf {
        self.binary("anaconda")
    }

    /// Idempotence check: an install exists iff the conda binary does.
    pub fn is_installed(&self) -> bool {
        self.conda().exists()
    }
}

/// Ensure a miniconda install exists and is configured.
///
/// Skips the download/install when `conda` is already present. Afterwards
/// updates conda, installs the toolbelt, resets the root `.condarc`, and
/// adds the user channel plus `extra_channels` (reversed, so the first
/// listed channel ends up with the highest precedence).
pub fn setup(
    mc: &Miniconda,
    arch: &str,
    binstar_user: Option<&str>,
    extra_channels: &[String],
) -> Result<(), MinicondaError> {
    let platform = HostPlatform::current();

    if mc.is_installed() {
        println!("conda is already setup at {}", mc.root().display());
    } else {
        println!("No existing conda install detected at {}", mc.root().display());
        let url = installer_url(platform, arch)?;
        let installer = temp_installer_path(platform);
        println!("Setting up miniconda from URL {}", url);
        println!("(Installing to '{}')", mc.root().display());
        download_installer(&url, &installer)?;
        report_installer_digest(&installer)?;
        install(platform, &installer, mc.root())?;
        fs::remove_file(&installer)?;
    }

    let conda = mc.conda();
    let mut cmds = vec![
        CommandSpec::for_binary(&conda).args(["update", "-q", "--yes", "conda"]),
        CommandSpec::for_binary(&conda).args([
            "install",
            "-q",
            "--yes",
            "conda-build",
            "conda-verify",
            "jinja2",
            "anaconda-client",
            "twine",
        ]),
    ];

    let root_config = mc.root().join(".condarc");
    if root_config.exists() {
        println!(
            "existing root config present at {} - removing",
            root_config.display()
        );
        fs::remove_file(&root_config)?;
    }

    match binstar_user {
        Some(user) => {
            println!("(adding user channel '{}' for dependencies to root config)", user);
            cmds.push(
                CommandSpec::for_binary(&conda)
                    .args(["config", "--system", "--add", "channels"])
                    .arg(user),
            );
        }
        None => println!(
            "No user channels have been configured (all dependencies have to be sourced from anaconda)"
        ),
    }

    for channel in extra_channels.iter().rev() {
        println!("adding extra channel '{}' for dependencies to root config", channel);
        cmds.push(
            CommandSpec::for_binary(&conda)
                .args(["config", "--system", "--add", "channels"])
                .arg(channel),
        );
    }

    process::execute_sequence(&cmds)?;
    Ok(())
}

fn download_installer(url: &str, dest: &Path) -> Result<(), MinicondaError> {
    println!("Downloading miniconda from {} to {}", url, dest.display());
    let spec = CommandSpec::new("curl")
        .args(["-sSL", "--retry", "0", "-o"])
        .arg(dest.to_string_lossy().into_owned())
        .arg(url);
    process::execute(&spec)?;
    Ok(())
}

fn report_installer_digest(installer: &Path) -> Result<(), MinicondaError> {
    let bytes = fs::read(installer)?;
    let digest = Sha256::digest(&bytes);
    println!("installer sha256: {}", hex::encode(digest));
    Ok(())
}

fn install(platform: HostPlatform, installer: &Path, dest: &Path) -> Result<(), MinicondaError> {
    println!("Installing miniconda to {}", dest.display());
    let installer_str = installer.to_string_lossy().into_owned();
    if platform.is_windows() {
        let spec = CommandSpec::new(installer_str)
            .args([
                "/InstallationType=AllUsers",
                "/AddToPath=0",
                "/RegisterPath=1",
                "/NoRegistry=1",
                "/S",
            ])
            .arg(format!("/D={}", dest.display()));
        process::execute(&spec)?;
    } else {
        process::execute(&CommandSpec::new("chmod").arg("+x").arg(installer_str.clone()))?;
        let spec = CommandSpec::new(installer_str)
            .args(["-b", "-p"])
            .arg(dest.to_string_lossy().into_owned());
        process::execute(&spec)?;
    }
    Ok(())
}
