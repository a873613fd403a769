//! In-process [`SyncRepo`] with failure injection.
//!
//! Every successful publish records a full snapshot of the working
//! directory; `reset_hard` restores one. Revisions are `fake-<n>` where `n`
//! indexes the snapshot list, so a test can compare heads before and after
//! a call exactly as it would with git.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tab_fs::NormalizedPath;
use tab_git::{Error, Result, Revision, SyncRepo};

type Snapshot = BTreeMap<PathBuf, Vec<u8>>;

#[derive(Default)]
struct FakeState {
    commits: Vec<Snapshot>,
    staged: BTreeSet<String>,
    messages: Vec<String>,
    fail_publish: usize,
    fail_pull: Option<String>,
    upstream: VecDeque<(String, String)>,
    resets: usize,
}

/// A repository whose "remote" lives in memory.
pub struct FakeRepo {
    root: NormalizedPath,
    state: Mutex<FakeState>,
}

impl FakeRepo {
    /// Wrap an existing directory; its current content becomes revision 0.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = NormalizedPath::new(root.as_ref());
        let initial = snapshot(&root.to_native());
        Self {
            root,
            state: Mutex::new(FakeState {
                commits: vec![initial],
                ..FakeState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject the next `count` publishes as if upstream had moved.
    pub fn fail_next_publishes(&self, count: usize) {
        self.state().fail_publish = count;
    }

    /// Make the next pull fail with `message`.
    pub fn fail_next_pull(&self, message: &str) {
        self.state().fail_pull = Some(message.to_string());
    }

    /// Queue a file change that the next pull will bring in.
    pub fn queue_upstream(&self, rel_path: &str, content: &str) {
        self.state()
            .upstream
            .push_back((rel_path.to_string(), content.to_string()));
    }

    /// Number of successful publishes, including pulls that merged changes.
    pub fn commit_count(&self) -> usize {
        self.state().commits.len() - 1
    }

    /// Commit messages of successful publishes, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.state().messages.clone()
    }

    /// Number of hard resets performed.
    pub fn reset_count(&self) -> usize {
        self.state().resets
    }

    /// Files currently staged.
    pub fn staged(&self) -> Vec<String> {
        self.state().staged.iter().cloned().collect()
    }
}

impl SyncRepo for FakeRepo {
    fn working_dir(&self) -> &NormalizedPath {
        &self.root
    }

    fn head(&self) -> Result<Revision> {
        let state = self.state();
        Ok(Revision::new(format!("fake-{}", state.commits.len() - 1)))
    }

    fn stage(&self, path: &str) -> Result<()> {
        if !self.root.join(path).exists() {
            return Err(Error::CommandFailed {
                command: format!("add -- {path}"),
                stderr: format!("fatal: pathspec '{path}' did not match any files"),
            });
        }
        self.state().staged.insert(path.to_string());
        Ok(())
    }

    fn publish(&self, message: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_publish > 0 {
            state.fail_publish -= 1;
            return Err(Error::PushFailed {
                message: "! [rejected] HEAD -> main (fetch first)".into(),
            });
        }
        state.staged.clear();
        state.messages.push(message.to_string());
        let snap = snapshot(&self.root.to_native());
        state.commits.push(snap);
        Ok(())
    }

    fn reset_hard(&self, revision: &Revision) -> Result<()> {
        let mut state = self.state();
        let index = revision
            .as_str()
            .strip_prefix("fake-")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n < state.commits.len())
            .ok_or_else(|| Error::ResetFailed {
                revision: revision.to_string(),
                message: "unknown revision".into(),
            })?;

        restore(&self.root.to_native(), &state.commits[index]);
        state.commits.truncate(index + 1);
        state.staged.clear();
        state.resets += 1;
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        let mut state = self.state();
        if let Some(message) = state.fail_pull.take() {
            return Err(Error::PullFailed { message });
        }
        if state.upstream.is_empty() {
            return Ok(());
        }
        while let Some((rel, content)) = state.upstream.pop_front() {
            let path = self.root.join(&rel).to_native();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::PullFailed {
                    message: tab_fs::Error::io(parent, e).to_string(),
                })?;
            }
            fs::write(&path, content).map_err(|e| Error::PullFailed {
                message: tab_fs::Error::io(&path, e).to_string(),
            })?;
        }
        let snap = snapshot(&self.root.to_native());
        state.commits.push(snap);
        Ok(())
    }
}

fn snapshot(root: &Path) -> Snapshot {
    let mut files = Snapshot::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Snapshot) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(root, &path, files);
        } else if let Ok(content) = fs::read(&path) {
            let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.insert(rel, content);
        }
    }
}

fn restore(root: &Path, target: &Snapshot) {
    let current = snapshot(root);
    for rel in current.keys() {
        if !target.contains_key(rel) {
            let _ = fs::remove_file(root.join(rel));
        }
    }
    for (rel, content) in target {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(path, content);
    }
}
