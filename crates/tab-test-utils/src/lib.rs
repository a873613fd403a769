//! Shared test utilities for the bar-tab workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`]: seeded ledger and catalog content
//! - [`git`]: real git repositories with a bare remote
//! - [`fake`]: [`FakeRepo`], an in-process `SyncRepo` with failure injection
//! - [`repo`]: [`TestLedger`] temporary data directory builder

pub mod fake;
pub mod fixtures;
pub mod git;
pub mod repo;

pub use fake::FakeRepo;
pub use git::GitRemote;
pub use repo::TestLedger;
