use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceControlError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("`{command}` produced non UTF-8 output")]
    InvalidOutput { command: String },

    #[error("`{command}` produced no output")]
    EmptyOutput { command: String },
}

/// Outcome of one source-control query.
///
/// Keeps "could not ask" apart from the answer itself, so an unavailable
/// dirty flag is never mistaken for a clean tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probed<T> {
    Known(T),
    Unavailable(String),
}

impl<T> Probed<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl<T> From<Result<T, SourceControlError>> for Probed<T> {
    fn from(result: Result<T, SourceControlError>) -> Self {
        match result {
            Ok(value) => Self::Known(value),
            Err(err) => {
                log::debug!("Source control unavailable: {err}");
                Self::Unavailable(err.to_string())
            }
        }
    }
}

/// Queries the build needs from a version control system.
pub trait SourceControl {
    /// Short identifier of the checked out revision.
    fn revision(&self) -> Result<String, SourceControlError>;

    /// Current branch or stream name.
    fn branch(&self) -> Result<String, SourceControlError>;

    /// Whether the working tree has uncommitted changes.
    fn is_dirty(&self) -> Result<bool, SourceControlError>;
}

/// Git via the `git` executable on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Git {
    dir: Option<PathBuf>,
}

impl Git {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, SourceControlError> {
        let command = format!("git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| SourceControlError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(SourceControlError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| SourceControlError::InvalidOutput {
                command: command.clone(),
            })?;
        Ok(stdout.trim().to_string())
    }

    fn run_nonempty(&self, args: &[&str]) -> Result<String, SourceControlError> {
        let out = self.run(args)?;
        if out.is_empty() {
            return Err(SourceControlError::EmptyOutput {
                command: format!("git {}", args.join(" ")),
            });
        }
        Ok(out)
    }
}

impl SourceControl for Git {
    fn revision(&self) -> Result<String, SourceControlError> {
        self.run_nonempty(&["rev-parse", "--short", "HEAD"])
    }

    fn branch(&self) -> Result<String, SourceControlError> {
        self.run_nonempty(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn is_dirty(&self) -> Result<bool, SourceControlError> {
        Ok(!self.run(&["status", "--porcelain"])?.is_empty())
    }
}
