//! `SyncRepo` backed by the `git` command-line tool

use std::process::{Command, Output};

use crate::{Error, Result, Revision, SyncRepo};
use tab_fs::NormalizedPath;

/// Runs `git` as a subprocess inside the data directory.
///
/// Relies on the checkout's own configuration for the upstream branch,
/// commit identity and credentials.
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Repository root directory (where .git lives)
    root: NormalizedPath,
}

impl GitCli {
    /// Create a GitCli for the given repository root.
    ///
    /// Verifies that `.git` exists in the root directory.
    pub fn new(root: NormalizedPath) -> Result<Self> {
        if !root.join(".git").exists() {
            return Err(Error::NotARepository {
                path: root.as_str().to_string(),
            });
        }

        Ok(Self { root })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let command = args.join(" ");
        tracing::debug!(root = %self.root, %command, "Running git");

        Command::new("git")
            .args(args)
            .current_dir(self.root.to_native())
            .output()
            .map_err(|source| Error::Spawn { command, source })
    }

    /// Run a git command and return its trimmed stdout.
    fn git_command(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::CommandFailed {
                command: args.join(" "),
                stderr: diagnostic(&output),
            })
        }
    }

    /// Whether anything is staged for commit.
    fn has_staged_changes(&self) -> Result<bool> {
        let output = self.run(&["diff", "--cached", "--quiet"])?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::CommandFailed {
                command: "diff --cached --quiet".into(),
                stderr: diagnostic(&output),
            }),
        }
    }
}

/// Prefer stderr, fall back to stdout (some git failures only print there).
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

impl SyncRepo for GitCli {
    fn working_dir(&self) -> &NormalizedPath {
        &self.root
    }

    fn head(&self) -> Result<Revision> {
        self.git_command(&["rev-parse", "HEAD"]).map(Revision::new)
    }

    fn stage(&self, path: &str) -> Result<()> {
        self.git_command(&["add", "--", path])?;
        Ok(())
    }

    fn publish(&self, message: &str) -> Result<()> {
        if self.has_staged_changes()? {
            self.git_command(&["commit", "--no-verify", "-m", message])?;
        }

        self.git_command(&["push"])
            .map_err(|e| Error::PushFailed {
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn reset_hard(&self, revision: &Revision) -> Result<()> {
        self.git_command(&["reset", "--hard", revision.as_str()])
            .map_err(|e| Error::ResetFailed {
                revision: revision.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        match self.git_command(&["pull", "--no-rebase", "--no-edit"]) {
            Ok(_) => Ok(()),
            Err(e) => {
                // Leave the checkout as it was before the pull
                if let Err(abort) = self.git_command(&["merge", "--abort"]) {
                    tracing::debug!(error = %abort, "No merge to abort after failed pull");
                }
                Err(Error::PullFailed {
                    message: e.to_string(),
                })
            }
        }
    }
}
