//! Product catalog loading

use indexmap::IndexMap;
use serde_yaml::Value;
use tab_fs::{ConfigStore, DataPath, NormalizedPath};

use crate::product::Product;
use crate::{Error, Result};

/// Products by name, in catalog order.
pub type Catalog = IndexMap<String, Product>;

/// Parse a YAML catalog document.
///
/// The document must be a list of products; names must be unique.
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let origin = NormalizedPath::new(DataPath::ProductCatalog.as_str());
    parse_from(content, &origin)
}

/// Read and parse the catalog at `path`.
pub fn load_catalog(path: &NormalizedPath) -> Result<Catalog> {
    let content = tab_fs::io::read_text(path)?;
    parse_from(&content, path)
}

fn parse_from(content: &str, origin: &NormalizedPath) -> Result<Catalog> {
    let document: Value = ConfigStore::new()
        .parse(content, "yml", origin)
        .map_err(|e| Error::Catalog {
            message: e.to_string(),
        })?;

    let Value::Sequence(items) = document else {
        return Err(Error::Catalog {
            message: "products should be a list".into(),
        });
    };

    let mut catalog = Catalog::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let product: Product = serde_yaml::from_value(item).map_err(|e| Error::Catalog {
            message: format!("product #{}: {e}", index + 1),
        })?;
        if !tab_ledger::is_currency(&product.currency) {
            return Err(Error::Catalog {
                message: format!(
                    "product {}: currency '{}' must be upper-case",
                    product.name, product.currency
                ),
            });
        }
        if let Some(payback) = product
            .payback
            .as_ref()
            .filter(|p| !tab_ledger::is_account(&p.account))
        {
            return Err(Error::Catalog {
                message: format!(
                    "product {}: invalid payback account '{}'",
                    product.name, payback.account
                ),
            });
        }
        if catalog.contains_key(&product.name) {
            return Err(Error::DuplicateProduct { name: product.name });
        }
        catalog.insert(product.name.clone(), product);
    }

    tracing::debug!(products = catalog.len(), "Parsed product catalog");
    Ok(catalog)
}
