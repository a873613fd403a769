//! Commit/rollback protocol around publishing to the shared repository

use tab_git::SyncRepo;
use tracing::{error, warn};

use crate::{Error, Result};

/// Run `block`, then commit and push what it staged.
///
/// If the block or the publish fails, the checkout is hard-reset to the
/// revision that was current before the block ran and the original error is
/// returned. Nothing is retried. A failed reset yields
/// [`Error::RollbackFailed`] carrying both errors.
pub fn with_rollback<R, T, F>(repo: &R, message: &str, block: F) -> Result<T>
where
    R: SyncRepo + ?Sized,
    F: FnOnce() -> Result<T>,
{
    let recorded = repo.head()?;

    let outcome = block().and_then(|value| {
        repo.publish(message)?;
        Ok(value)
    });

    let original = match outcome {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    warn!(revision = %recorded, error = %original, "Rolling back failed update");
    if let Err(reset) = repo.reset_hard(&recorded) {
        error!(revision = %recorded, error = %reset, "Rollback failed");
        return Err(Error::RollbackFailed {
            revision: recorded.to_string(),
            original: Box::new(original),
            reset,
        });
    }
    Err(original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tab_fs::NormalizedPath;
    use tab_git::Revision;

    /// Records calls; publish and reset outcomes are scripted.
    struct ScriptedRepo {
        root: NormalizedPath,
        fail_publish: bool,
        fail_reset: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRepo {
        fn new(fail_publish: bool, fail_reset: bool) -> Self {
            Self {
                root: NormalizedPath::new("/data"),
                fail_publish,
                fail_reset,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl SyncRepo for ScriptedRepo {
        fn working_dir(&self) -> &NormalizedPath {
            &self.root
        }

        fn head(&self) -> tab_git::Result<Revision> {
            self.record("head".into());
            Ok(Revision::new("abc123"))
        }

        fn stage(&self, path: &str) -> tab_git::Result<()> {
            self.record(format!("stage {path}"));
            Ok(())
        }

        fn publish(&self, message: &str) -> tab_git::Result<()> {
            self.record(format!("publish {message}"));
            if self.fail_publish {
                return Err(tab_git::Error::PushFailed {
                    message: "rejected".into(),
                });
            }
            Ok(())
        }

        fn reset_hard(&self, revision: &Revision) -> tab_git::Result<()> {
            self.record(format!("reset {revision}"));
            if self.fail_reset {
                return Err(tab_git::Error::ResetFailed {
                    revision: revision.to_string(),
                    message: "locked index".into(),
                });
            }
            Ok(())
        }

        fn pull(&self) -> tab_git::Result<()> {
            self.record("pull".into());
            Ok(())
        }
    }

    #[test]
    fn success_publishes_without_reset() {
        let repo = ScriptedRepo::new(false, false);

        let value = with_rollback(&repo, "msg", || {
            repo.stage("a")?;
            Ok(42)
        })
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(repo.calls(), vec!["head", "stage a", "publish msg"]);
    }

    #[test]
    fn block_failure_resets_without_publishing() {
        let repo = ScriptedRepo::new(false, false);

        let result: Result<()> = with_rollback(&repo, "msg", || Err(Error::MissingTitle));

        assert!(matches!(result, Err(Error::MissingTitle)));
        assert_eq!(repo.calls(), vec!["head", "reset abc123"]);
    }

    #[test]
    fn publish_failure_resets_and_returns_original() {
        let repo = ScriptedRepo::new(true, false);

        let result = with_rollback(&repo, "msg", || Ok(()));

        assert!(matches!(
            result,
            Err(Error::Git(tab_git::Error::PushFailed { .. }))
        ));
        assert_eq!(repo.calls(), vec!["head", "publish msg", "reset abc123"]);
    }

    #[test]
    fn failed_reset_reports_both_errors() {
        let repo = ScriptedRepo::new(true, true);

        let result = with_rollback(&repo, "msg", || Ok(()));

        let Err(Error::RollbackFailed {
            revision, original, ..
        }) = result
        else {
            panic!("expected RollbackFailed, got {result:?}");
        };
        assert_eq!(revision, "abc123");
        assert!(matches!(*original, Error::Git(tab_git::Error::PushFailed { .. })));
    }
}
