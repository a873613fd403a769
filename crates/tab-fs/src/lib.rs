//! Filesystem layer for the bar-tab ledger
//!
//! Provides data-directory path resolution, exclusive creation, locked
//! appends and format-agnostic configuration loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::DataPath;
pub use error::{Error, Result};
pub use io::CreateOutcome;
pub use path::NormalizedPath;
