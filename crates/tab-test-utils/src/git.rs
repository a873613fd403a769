//! Real git repositories for end-to-end tests.
//!
//! A [`GitRemote`] owns a bare repository seeded with the fixture data
//! directory. Each call to [`GitRemote::clone_checkout`] produces an
//! independent working copy, standing in for one server process.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::fixtures;

/// Run `git` in `dir`, returning trimmed stdout.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("run_git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "run_git: `git {args:?}` failed in {}:\n{}",
            dir.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Configure identity and merge behaviour for a test checkout.
fn configure_checkout(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@test.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
    run_git(dir, &["config", "pull.rebase", "false"]);
}

/// A bare remote seeded with the fixture data directory.
pub struct GitRemote {
    temp_dir: TempDir,
}

impl Default for GitRemote {
    fn default() -> Self {
        Self::seeded()
    }
}

impl GitRemote {
    /// Create a bare remote whose first commit holds the fixture files.
    pub fn seeded() -> Self {
        Self::seeded_with(fixtures::write_data_dir)
    }

    /// Create a bare remote whose first commit holds whatever `seed` writes.
    pub fn seeded_with(seed: impl FnOnce(&Path)) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let remote = temp_dir.path().join("remote.git");
        std::fs::create_dir_all(&remote).unwrap();
        run_git(&remote, &["init", "--bare"]);

        let this = Self { temp_dir };
        let seed_dir = this.clone_checkout("seed");
        seed(&seed_dir);
        run_git(&seed_dir, &["add", "-A"]);
        run_git(&seed_dir, &["commit", "-m", "Seed ledger"]);
        run_git(&seed_dir, &["push", "-u", "origin", "HEAD"]);
        this
    }

    /// Path to the bare repository.
    pub fn remote_path(&self) -> PathBuf {
        self.temp_dir.path().join("remote.git")
    }

    /// Clone the remote into a fresh working copy named `name`.
    pub fn clone_checkout(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        let remote = self.remote_path();
        run_git(
            self.temp_dir.path(),
            &[
                "clone",
                remote.to_str().expect("temp paths are UTF-8"),
                target.to_str().expect("temp paths are UTF-8"),
            ],
        );
        configure_checkout(&target);
        target
    }

    /// Commit `content` as `rel_path` from a throwaway checkout and push it,
    /// as another server would.
    pub fn push_change(&self, checkout: &str, rel_path: &str, content: &str) {
        let dir = self.temp_dir.path().join(checkout);
        if !dir.exists() {
            self.clone_checkout(checkout);
        } else {
            run_git(&dir, &["pull", "--no-rebase", "--no-edit"]);
        }
        let path = dir.join(rel_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        run_git(&dir, &["add", "--", rel_path]);
        run_git(&dir, &["commit", "-m", &format!("Update {rel_path}")]);
        run_git(&dir, &["push"]);
    }

    /// Head revision of the remote's default branch.
    pub fn remote_head(&self) -> String {
        run_git(&self.remote_path(), &["rev-parse", "HEAD"])
    }
}

/// Head revision of a working copy.
pub fn head_of(dir: &Path) -> String {
    run_git(dir, &["rev-parse", "HEAD"])
}
