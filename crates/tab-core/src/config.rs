//! Server configuration

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tab_fs::{ConfigStore, NormalizedPath};

use crate::Result;

fn default_currency() -> String {
    "EUR".to_string()
}

/// Settings a bar-tab server starts from.
///
/// Loaded from TOML, YAML or JSON:
///
/// ```toml
/// data_dir = "/srv/bartab-data"
/// currency = "EUR"
/// instance_name = "bar01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Git checkout holding the ledger and catalog
    pub data_dir: PathBuf,
    /// Settlement currency for member balances
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Prefix of this server's instance ledger; the host name when unset
    #[serde(default)]
    pub instance_name: Option<String>,
}

impl ServerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            currency: default_currency(),
            instance_name: None,
        }
    }

    /// Load a config file and canonicalize its data directory.
    ///
    /// A relative `data_dir` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Self = ConfigStore::new().load(&NormalizedPath::new(path))?;

        if config.data_dir.is_relative()
            && let Some(base) = path.parent()
        {
            config.data_dir = base.join(&config.data_dir);
        }
        config.data_dir = NormalizedPath::canonical(&config.data_dir)?.to_native();

        tracing::debug!(data_dir = %config.data_dir.display(), "Loaded server config");
        Ok(config)
    }

    pub fn instance_name(&self) -> String {
        self.instance_name
            .clone()
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned())
    }
}
