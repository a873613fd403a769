//! Per-process instance ledger allocation
//!
//! Each engine appends its transactions to a shard of its own under
//! `ledger/`, so concurrent servers never edit the same file on the hot
//! path. A shard is registered once in `ledger/dynamic.ledger` and keeps its
//! name for the life of the [`InstanceLog`].

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::Duration;

use backoff::backoff::Constant;
use chrono::{DateTime, Utc};
use tab_fs::{CreateOutcome, DataPath, NormalizedPath};
use tab_git::SyncRepo;
use tracing::{debug, info, warn};

use crate::commit::with_rollback;
use crate::{Error, Result};

/// Source of allocation timestamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The shard this process appends to.
pub struct InstanceLog {
    host: String,
    clock: Clock,
    retry_delay: Duration,
    /// Path relative to the data directory; never changes once set
    name: Option<String>,
    /// Only open while `name` is set
    handle: Option<File>,
}

impl fmt::Debug for InstanceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLog")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

impl InstanceLog {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            clock: Box::new(Utc::now),
            retry_delay: DEFAULT_RETRY_DELAY,
            name: None,
            handle: None,
        }
    }

    /// Replace the wall clock used to name new shards.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Wait between attempts after a name collision (one second by default).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Allocated shard, relative to the data directory.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Allocate the shard if needed and open it for appending.
    ///
    /// Idempotent; reopens the same file after [`close`](Self::close).
    pub fn open<R: SyncRepo + ?Sized>(&mut self, repo: &R) -> Result<String> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => {
                let name = self.allocate(repo)?;
                self.name = Some(name.clone());
                name
            }
        };

        if self.handle.is_none() {
            let path = repo.working_dir().join(&name);
            self.handle = Some(tab_fs::io::open_append(&path)?);
            debug!(instance_ledger = %name, "Opened instance ledger");
        }
        Ok(name)
    }

    /// Drop the file handle. The name is kept.
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            debug!(instance_ledger = ?self.name, "Closed instance ledger");
        }
    }

    /// Append `text` and flush it to disk.
    pub fn append(&mut self, text: &str) -> Result<()> {
        let handle = self.handle.as_mut().ok_or(Error::InstanceLogClosed)?;
        handle.write_all(text.as_bytes())?;
        handle.flush()?;
        handle.sync_data()?;
        Ok(())
    }

    fn candidate(&self) -> String {
        let now = (self.clock)();
        format!("{}_{}.ledger", self.host, now.format("%Y%m%dT%H%M%S%.6fZ"))
    }

    /// Claim a fresh shard and register it upstream.
    fn allocate<R: SyncRepo + ?Sized>(&self, repo: &R) -> Result<String> {
        let root = repo.working_dir();
        let file_name = self.create_unique(root)?;
        let rel = format!("{}/{}", DataPath::LedgerDir, file_name);
        let includes = DataPath::DynamicIncludes.as_str();

        let registered = with_rollback(repo, &format!("Add instance ledger {file_name}"), || {
            let line = format!("include \"{file_name}\"\n");
            tab_fs::io::append_locked(&root.join(includes), line.as_bytes())?;
            repo.stage(&rel)?;
            repo.stage(includes)?;
            Ok(())
        });

        if let Err(e) = registered {
            if let Err(cleanup) = tab_fs::io::remove_if_exists(&root.join(&rel)) {
                warn!(instance_ledger = %rel, error = %cleanup, "Failed to remove unregistered shard");
            }
            return Err(e);
        }

        info!(instance_ledger = %rel, "Got instance ledger");
        Ok(rel)
    }

    /// Exclusively create `ledger/<host>_<timestamp>.ledger`, retrying with
    /// a new timestamp until a name is free.
    fn create_unique(&self, root: &NormalizedPath) -> Result<String> {
        let dir = root.join(DataPath::LedgerDir.as_str());
        let attempt = || {
            let candidate = self.candidate();
            match tab_fs::io::create_exclusive(&dir.join(&candidate)) {
                Ok(CreateOutcome::Created) => Ok(candidate),
                Ok(CreateOutcome::AlreadyExists) => {
                    debug!(candidate = %candidate, "Instance ledger name taken, retrying");
                    Err(backoff::Error::transient(Error::NameCollision { name: candidate }))
                }
                Err(e) => Err(backoff::Error::permanent(Error::from(e))),
            }
        };

        backoff::retry(Constant::new(self.retry_delay), attempt).map_err(|e| match e {
            backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn candidate_uses_host_and_utc_timestamp() {
        let log = InstanceLog::new("bar01")
            .with_clock(|| Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 3).unwrap());

        assert_eq!(log.candidate(), "bar01_20240501T120003.000000Z.ledger");
    }

    #[test]
    fn append_requires_open_log() {
        let mut log = InstanceLog::new("bar01");
        assert!(matches!(log.append("x"), Err(Error::InstanceLogClosed)));
        assert_eq!(log.name(), None);
        assert!(!log.is_open());
    }
}
