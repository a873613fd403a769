//! Git synchronization for the bar-tab ledger
//!
//! The ledger data directory is a git checkout used as a replicated append
//! log. This crate exposes the handful of operations the engine needs
//! through [`SyncRepo`] and implements them with the `git` binary in
//! [`GitCli`].

pub mod cli;
pub mod error;
pub mod provider;

pub use cli::GitCli;
pub use error::{Error, Result};
pub use provider::{Revision, SyncRepo};
