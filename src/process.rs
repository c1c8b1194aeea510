//! External command execution
//!
//! Every external tool (the miniconda installer, `conda`, `anaconda`,
//! `twine`, `git`) is invoked through [`execute`] or [`capture`]. Output is
//! streamed line-by-line to the console as it is produced; a non-zero exit
//! status is an error, never silently tolerated.
//!
//! Credential arguments are registered with [`CommandSpec::secret_arg`] so
//! that the rendered command line (echoed before running, and embedded in
//! any failure) never contains the secret value.

use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Replacement text for masked arguments.
pub const MASK: &str = "*****";

/// Errors from external command invocation.
///
/// The `command` field always holds the masked rendering, safe to print.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed reading output of '{command}': {source}")]
    Stream {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command '{command}' exited with status {code}")]
    NonZeroExit { command: String, code: i32 },
}

enum Arg {
    Plain(String),
    Secret(String),
}

/// A command to run, with environment edits and secret masking.
pub struct CommandSpec {
    program: String,
    args: Vec<Arg>,
    env_additions: Vec<(String, String)>,
    env_removals: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env_additions: Vec::new(),
            env_removals: Vec::new(),
        }
    }

    /// Convenience constructor for a binary at a filesystem path.
    pub fn for_binary(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(Arg::Plain(arg.into()));
        }
        self
    }

    /// An argument whose value must never be echoed or surfaced in errors.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Secret(arg.into()));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_additions.push((key.into(), value.into()));
        self
    }

    /// Remove a variable from the child environment.
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_removals.push(key.into());
        self
    }

    /// Command line with secret arguments masked. Safe to print.
    pub fn rendered(&self) -> String {
        let mut parts = vec![self.program.clone()];
        for arg in &self.args {
            match arg {
                Arg::Plain(s) => parts.push(s.clone()),
                Arg::Secret(_) => parts.push(MASK.to_string()),
            }
        }
        parts.join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            match arg {
                Arg::Plain(s) | Arg::Secret(s) => {
                    cmd.arg(s);
                }
            }
        }
        for (key, value) in &self.env_additions {
            cmd.env(key, value);
        }
        for key in &self.env_removals {
            cmd.env_remove(key);
        }
        cmd
    }
}

/// Run a command, echoing it and streaming its stdout to the console.
///
/// stderr is inherited so diagnostics interleave on the CI console.
pub fn execute(spec: &CommandSpec) -> Result<(), CommandError> {
    let rendered = spec.rendered();
    println!("> {}", rendered);
    if !spec.env_additions.is_empty() {
        let extras: Vec<String> = spec
            .env_additions
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("Additional environment variables: {}", extras.join(", "));
    }

    let mut child = spec
        .build()
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            let line = line.map_err(|source| CommandError::Stream {
                command: rendered.clone(),
                source,
            })?;
            println!("{}", line);
            let _ = io::stdout().flush();
        }
    }

    let status = child.wait().map_err(|source| CommandError::Stream {
        command: rendered.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(CommandError::NonZeroExit {
            command: rendered,
            code: status.code().unwrap_or(-1),
        })
    }
}

/// Run each command in order, stopping at the first failure.
pub fn execute_sequence(specs: &[CommandSpec]) -> Result<(), CommandError> {
    for spec in specs {
        execute(spec)?;
    }
    Ok(())
}

/// Run a command and return its stdout, trimmed.
pub fn capture(spec: &CommandSpec) -> Result<String, CommandError> {
    let rendered = spec.rendered();
    let output = spec
        .build()
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| CommandError::Spawn {
            command: rendered.clone(),
            source,
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(CommandError::NonZeroExit {
            command: rendered,
            code: output.status.code().unwrap_or(-1),
        })
    }
}
