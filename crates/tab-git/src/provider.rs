//! Synchronized repository trait

use std::sync::Arc;

use crate::Result;
use tab_fs::NormalizedPath;

/// A commit identifier as reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations the ledger engine needs from the replicated repository.
///
/// Every call is blocking and reports failure synchronously. Paths passed to
/// [`stage`](SyncRepo::stage) are relative to
/// [`working_dir`](SyncRepo::working_dir).
pub trait SyncRepo: Send + Sync {
    /// Root of the checked-out data directory.
    fn working_dir(&self) -> &NormalizedPath;

    /// Current head revision.
    fn head(&self) -> Result<Revision>;

    /// Add a file to the index.
    fn stage(&self, path: &str) -> Result<()>;

    /// Commit whatever is staged and push it upstream.
    ///
    /// An empty index skips the commit but still pushes. A push rejected
    /// because upstream moved is an error; nothing is retried.
    fn publish(&self, message: &str) -> Result<()>;

    /// Discard all local changes and move head to `revision`.
    fn reset_hard(&self, revision: &Revision) -> Result<()>;

    /// Merge upstream changes, aborting the merge on conflict.
    fn pull(&self) -> Result<()>;
}

impl<T: SyncRepo + ?Sized> SyncRepo for &T {
    fn working_dir(&self) -> &NormalizedPath {
        (**self).working_dir()
    }

    fn head(&self) -> Result<Revision> {
        (**self).head()
    }

    fn stage(&self, path: &str) -> Result<()> {
        (**self).stage(path)
    }

    fn publish(&self, message: &str) -> Result<()> {
        (**self).publish(message)
    }

    fn reset_hard(&self, revision: &Revision) -> Result<()> {
        (**self).reset_hard(revision)
    }

    fn pull(&self) -> Result<()> {
        (**self).pull()
    }
}

impl<T: SyncRepo + ?Sized> SyncRepo for Arc<T> {
    fn working_dir(&self) -> &NormalizedPath {
        (**self).working_dir()
    }

    fn head(&self) -> Result<Revision> {
        (**self).head()
    }

    fn stage(&self, path: &str) -> Result<()> {
        (**self).stage(path)
    }

    fn publish(&self, message: &str) -> Result<()> {
        (**self).publish(message)
    }

    fn reset_hard(&self, revision: &Revision) -> Result<()> {
        (**self).reset_hard(revision)
    }

    fn pull(&self) -> Result<()> {
        (**self).pull()
    }
}
