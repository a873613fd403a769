//! The ledger engine: durable appends and the in-memory balance view

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tab_fs::{DataPath, NormalizedPath};
use tab_git::{GitCli, SyncRepo};
use tab_ledger::{Entry, aggregate_balances, load_file, parent, print_errors, print_transaction};
use tracing::{error, info, warn};

use crate::catalog::{Catalog, load_catalog};
use crate::commit::with_rollback;
use crate::config::ServerConfig;
use crate::instance_log::InstanceLog;
use crate::member::{CASH_ACCOUNT, MEMBERS_PARENT, Member};
use crate::txn::Transaction;
use crate::{Error, Result};

/// Everything clients read: members and products.
///
/// Built in full by a reload and replaced wholesale; never mutated in place
/// once published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    /// Internal name to account path
    pub accounts: BTreeMap<String, String>,
    /// Account path to member
    pub accounts_raw: BTreeMap<String, Member>,
    /// Products by name, in catalog order
    pub products: Catalog,
}

impl Directory {
    fn insert(&mut self, member: Member) {
        self.accounts
            .insert(member.internal_name.clone(), member.account.clone());
        self.accounts_raw.insert(member.account.clone(), member);
    }

    /// Look a member up by internal name.
    pub fn member(&self, internal_name: &str) -> Option<&Member> {
        self.accounts
            .get(internal_name)
            .and_then(|account| self.accounts_raw.get(account))
    }

    fn apply(&mut self, txn: &Transaction) {
        for posting in txn.postings() {
            if let (Some(member), Some(units)) =
                (self.accounts_raw.get_mut(&posting.account), &posting.units)
            {
                member.balance.add_amount(units);
            }
        }
    }
}

struct EngineState {
    instance_log: InstanceLog,
}

/// Shared ledger engine over a synchronized data checkout.
///
/// Mutating calls are serialized by one lock. Readers take an
/// `Arc<Directory>` snapshot and never block writers for longer than the
/// pointer swap.
pub struct RepoData<R: SyncRepo> {
    repo: R,
    state: Mutex<EngineState>,
    directory: RwLock<Arc<Directory>>,
}

impl RepoData<GitCli> {
    /// Engine over the git checkout named by `config`.
    pub fn open(config: &ServerConfig) -> Result<Self> {
        let repo = GitCli::new(NormalizedPath::new(&config.data_dir))?;
        Ok(Self::new(repo, InstanceLog::new(config.instance_name())))
    }
}

impl<R: SyncRepo> RepoData<R> {
    /// An unloaded engine; call [`load_data`](Self::load_data) before use.
    pub fn new(repo: R, instance_log: InstanceLog) -> Self {
        Self {
            repo,
            state: Mutex::new(EngineState { instance_log }),
            directory: RwLock::new(Arc::new(Directory::default())),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    // State is only written after every fallible step succeeded, so a
    // poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_directory(&self, directory: Directory) {
        let mut current = self.directory.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(directory);
    }

    /// Current snapshot.
    pub fn directory(&self) -> Arc<Directory> {
        Arc::clone(&self.directory.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn accounts(&self) -> BTreeMap<String, String> {
        self.directory().accounts.clone()
    }

    pub fn accounts_raw(&self) -> BTreeMap<String, Member> {
        self.directory().accounts_raw.clone()
    }

    pub fn products(&self) -> Catalog {
        self.directory().products.clone()
    }

    /// Allocated instance ledger, relative to the data directory.
    pub fn instance_ledger_name(&self) -> Option<String> {
        self.lock().instance_log.name().map(str::to_string)
    }

    /// Rebuild the directory from the catalog and the ledger.
    ///
    /// On failure the previous directory stays in place.
    pub fn load_data(&self) -> Result<()> {
        let state = self.lock();
        self.reload(&state)
            .map_err(|e| Error::update_failed("Failed to load data", e))
    }

    /// Merge upstream changes and reload.
    ///
    /// A reload failure resets the checkout to where it was before the pull.
    pub fn pull_changes(&self) -> Result<()> {
        let mut state = self.lock();
        state.instance_log.close();

        let recorded = self
            .repo
            .head()
            .map_err(|e| Error::update_failed("Failed to read head", e.into()))?;

        if let Err(e) = self.repo.pull() {
            return Err(Error::UpdateFailed {
                message: e.to_string(),
                source: Some(Box::new(e.into())),
            });
        }
        info!(from = %recorded, "Pulled upstream changes");

        if let Err(cause) = self.reload(&state) {
            warn!(revision = %recorded, error = %cause, "Reload failed, resetting");
            if let Err(reset) = self.repo.reset_hard(&recorded) {
                error!(revision = %recorded, error = %reset, "Rollback failed");
                return Err(Error::RollbackFailed {
                    revision: recorded.to_string(),
                    original: Box::new(cause),
                    reset,
                });
            }
            return Err(Error::update_failed("Failed to reload data", cause));
        }

        state
            .instance_log
            .open(&self.repo)
            .map_err(|e| Error::update_failed("Failed to reopen instance ledger", e))?;
        Ok(())
    }

    /// Make `txn` durable, then reflect it in the directory.
    ///
    /// # Panics
    ///
    /// Panics if the postings do not balance.
    pub fn apply_txn(&self, txn: &Transaction) -> Result<()> {
        assert!(
            txn.is_balanced(),
            "Imbalanced transaction generated: {}",
            txn.title()
        );

        let mut state = self.lock();
        let name = state.instance_log.open(&self.repo)?;
        let text = print_transaction(txn.ledger_entry());

        let log = &mut state.instance_log;
        let durable = with_rollback(&self.repo, txn.title(), || {
            log.append(&text)?;
            self.repo.stage(&name)?;
            Ok(())
        });
        if let Err(e) = durable {
            // The reset may have replaced the file under the handle
            log.close();
            return Err(e);
        }

        let mut next = Directory::clone(&self.directory());
        next.apply(txn);
        self.publish_directory(next);
        Ok(())
    }

    /// Allocate or reopen this process's instance ledger.
    pub fn open_instance_ledger(&self) -> Result<String> {
        self.lock().instance_log.open(&self.repo)
    }

    pub fn close_instance_ledger(&self) {
        self.lock().instance_log.close();
    }

    /// Caller holds the state lock.
    fn reload(&self, _held: &EngineState) -> Result<()> {
        let directory = self.build_directory()?;
        info!(
            members = directory.accounts.len(),
            products = directory.products.len(),
            "Loaded data"
        );
        self.publish_directory(directory);
        Ok(())
    }

    fn build_directory(&self) -> Result<Directory> {
        let root = self.repo.working_dir();
        let products = load_catalog(&root.join(DataPath::ProductCatalog.as_str()))?;

        let loaded = load_file(&root.join(DataPath::MasterLedger.as_str()));
        if !loaded.errors.is_empty() {
            return Err(Error::UpdateFailed {
                message: format!("Failed to load ledger\n{}", print_errors(&loaded.errors)),
                source: None,
            });
        }

        let balances = aggregate_balances(&loaded.entries, |account| {
            account == CASH_ACCOUNT || parent(account) == Some(MEMBERS_PARENT)
        });

        let mut directory = Directory {
            products,
            ..Directory::default()
        };
        for entry in &loaded.entries {
            let Entry::Open(open) = entry else {
                continue;
            };
            let Some(balance) = balances.get(&open.account) else {
                warn!(account = %open.account, "Didn't load account as no balance found");
                continue;
            };
            let mut member = Member::new(&open.account)?.with_balance(balance.clone());
            if let Some(display_name) = open.meta.get("display_name") {
                member = member.with_display_name(display_name);
            }
            directory.insert(member);
        }
        Ok(directory)
    }
}
