//! Package version discovery
//!
//! The version string is needed before the package is built (so the package
//! itself cannot be imported). Projects managed by miniver or versioneer
//! carry a `_version.py`; each one found is evaluated with the provisioned
//! Python. Exactly one version is expected; zero falls back to the recipe's
//! `meta.yaml`, more than one is an unresolvable ambiguity.

use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::process::{self, CommandSpec};

/// Python snippet that recovers the version from a `_version.py` without
/// importing the surrounding package. Handles both miniver (`__version__`)
/// and versioneer (`get_versions()`).
const VERSION_EVAL_SNIPPET: &str = "\
import runpy, sys
g = runpy.run_path(sys.argv[1])
v = g.get('__version__')
if v is None:
    v = g['get_versions']()['version']
print(v)";

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("multiple _version.py files found - cannot resolve an unambiguous version: {0:?}")]
    Ambiguous(Vec<String>),

    #[error("unable to detect version from _version.py or meta.yaml")]
    NotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Directories under `root` that contain a file named `name`.
pub fn dirs_containing_file(name: &str, root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && entry.file_name() == name {
            if let Some(parent) = entry.path().parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    dirs
}

/// Detect the package version for the project rooted at `source_root`.
///
/// `python` is the interpreter from the miniconda install; `recipe_dir`
/// holds the conda `meta.yaml` used as a last-resort fallback for projects
/// with a hardcoded version.
pub fn detect_version(
    python: &Path,
    source_root: &Path,
    recipe_dir: &Path,
) -> Result<String, VersionError> {
    let mut versions = Vec::new();
    for dir in dirs_containing_file("_version.py", source_root) {
        let version_py = dir.join("_version.py");
        let spec = CommandSpec::for_binary(python)
            .arg("-c")
            .arg(VERSION_EVAL_SNIPPET)
            .arg(version_py.to_string_lossy().into_owned());
        match process::capture(&spec) {
            Ok(v) if !v.is_empty() => versions.push(v),
            Ok(_) => {}
            Err(e) => println!("could not evaluate {}: {}", version_py.display(), e),
        }
    }

    let version = match versions.len() {
        1 => versions.remove(0),
        0 => {
            // no _version.py: maybe the version is hardcoded in meta.yaml
            version_from_meta_yaml(recipe_dir)?.ok_or(VersionError::NotFound)?
        }
        _ => return Err(VersionError::Ambiguous(versions)),
    };

    if version.contains("dirty") {
        println!("WARNING - 'dirty' in version string - something has dirtied the working dir!");
        println!("        - Printing git status/git diff to diagnose what's wrong");
        let _ = process::execute(&CommandSpec::new("git").arg("status"));
        let _ = process::execute(&CommandSpec::new("git").arg("diff"));
    }

    Ok(version)
}

/// Read a literal `version:` field from the recipe's `meta.yaml`.
///
/// Jinja-templated values cannot be resolved here and yield `None`.
fn version_from_meta_yaml(recipe_dir: &Path) -> Result<Option<String>, VersionError> {
    let meta_path = recipe_dir.join("meta.yaml");
    if !meta_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&meta_path)?;
    let re = Regex::new(r#"(?m)^\s*version:\s*["']?([^"'\s]+)"#).expect("static regex");
    match re.captures(&content) {
        Some(caps) => {
            let value = caps[1].to_string();
            if value.contains('{') {
                // templated, e.g. {{ environ['CONDACI_VERSION'] }}
                Ok(None)
            } else {
                Ok(Some(value))
            }
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dirs_containing_file() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("pkg");
        let b = tmp.path().join("other/nested");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("_version.py"), "__version__ = '1.0.0'").unwrap();
        fs::write(b.join("_version.py"), "__version__ = '2.0.0'").unwrap();
        fs::write(tmp.path().join("unrelated.py"), "").unwrap();

        let mut dirs = dirs_containing_file("_version.py", tmp.path());
        dirs.sort();
        assert_eq!(dirs.len(), 2);
        assert!(dirs.contains(&a));
        assert!(dirs.contains(&b));
    }

    #[test]
    fn test_meta_yaml_literal_version() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("meta.yaml"),
            "package:\n  name: pkga\n  version: \"1.2.3\"\n",
        )
        .unwrap();

        let v = version_from_meta_yaml(tmp.path()).unwrap();
        assert_eq!(v.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_meta_yaml_templated_version_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("meta.yaml"),
            "package:\n  name: pkga\n  version: {{ environ['CONDACI_VERSION'] }}\n",
        )
        .unwrap();

        let v = version_from_meta_yaml(tmp.path()).unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn test_meta_yaml_missing() {
        let tmp = TempDir::new().unwrap();
        let v = version_from_meta_yaml(tmp.path()).unwrap();
        assert_eq!(v, None);
    }
}
