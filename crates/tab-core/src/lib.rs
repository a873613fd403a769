//! Durability and materialization engine for the bar-tab ledger
//!
//! Members, products and transactions on one side; a git checkout used as a
//! replicated append log on the other. The engine:
//!
//! - allocates a per-process instance ledger ([`InstanceLog`]) so concurrent
//!   servers append to different files
//! - builds balanced purchase, transfer and deposit transactions
//!   ([`Transaction`])
//! - makes every append durable by committing and pushing it, resetting the
//!   checkout when the push is rejected ([`commit::with_rollback`])
//! - keeps an in-memory balance view rebuilt from the ledger ([`RepoData`])
//!
//! # Example
//!
//! ```ignore
//! use tab_core::{RepoData, ServerConfig, Transaction, Money};
//!
//! let config = ServerConfig::load("server.toml".as_ref())?;
//! let engine = RepoData::open(&config)?;
//! engine.load_data()?;
//! let alice = engine.directory().member("Alice").cloned().unwrap();
//! let txn = Transaction::deposit(&alice, Money::parse("5")?, &config.currency, None)?;
//! engine.apply_txn(&txn)?;
//! ```

pub mod catalog;
pub mod commit;
pub mod config;
pub mod engine;
pub mod error;
pub mod instance_log;
pub mod logging;
pub mod member;
pub mod money;
pub mod product;
pub mod txn;

pub use catalog::{Catalog, load_catalog, parse_catalog};
pub use config::ServerConfig;
pub use engine::{Directory, RepoData};
pub use error::{Error, Result};
pub use instance_log::InstanceLog;
pub use member::{CASH_ACCOUNT, Member};
pub use money::Money;
pub use product::{Payback, Product};
pub use txn::{Transaction, TransactionBuilder, TxnDate, TxnKind};
