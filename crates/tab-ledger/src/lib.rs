//! Plain-text double-entry ledger support for the bar tab
//!
//! Reads the subset of beancount syntax the bar-tab data repository uses,
//! prints entries back to text, and aggregates balances.
//!
//! The surface is deliberately narrow:
//!
//! - [`load_file`] parses a ledger and everything it includes, returning the
//!   entries, options and every error found (errors are collected, never
//!   thrown)
//! - [`print_transaction`] renders a transaction so it can be appended to a file
//! - [`compute_residual`] / [`infer_tolerances`] check that postings balance
//! - [`aggregate_balances`] sums positions per account

mod amount;
mod booking;
mod entry;
mod error;
mod loader;
mod parser;
mod printer;
mod query;

pub use amount::{Amount, Inventory, Tolerances};
pub use booking::{compute_residual, infer_tolerances};
pub use entry::{Close, Entry, Meta, Open, Posting, Transaction};
pub use error::{LedgerError, Location};
pub use loader::{Loaded, Options, load_file, load_str};
pub use parser::{is_account, is_currency, is_meta_key};
pub use printer::{print_errors, print_transaction};
pub use query::{aggregate_balances, parent};
