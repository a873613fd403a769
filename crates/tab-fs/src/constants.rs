//! Well-known locations inside the ledger data directory.

use std::path::Path;

/// Files and directories the engine expects in a data checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPath {
    /// Top-level ledger that every load starts from
    MasterLedger,
    /// Directory holding the per-instance shards
    LedgerDir,
    /// Include list that every instance shard is registered into
    DynamicIncludes,
    /// Static product catalog
    ProductCatalog,
}

impl DataPath {
    /// Get the path relative to the data directory root.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterLedger => "bartab.ledger",
            Self::LedgerDir => "ledger",
            Self::DynamicIncludes => "ledger/dynamic.ledger",
            Self::ProductCatalog => "static/products.yml",
        }
    }
}

impl AsRef<Path> for DataPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for DataPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for DataPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
