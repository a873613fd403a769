//! Catalog products

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Share of a product's price credited to a member on every sale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payback {
    pub account: String,
    pub amount: Money,
}

/// Something the bar sells.
///
/// Serializes to the client view: name, localized names, currency and the
/// price as a two-decimal string. The payback never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Language code (`en`, `nl`, ...) to display name
    #[serde(default)]
    pub localized_name: BTreeMap<String, String>,
    /// Short upper-case inventory unit
    pub currency: String,
    pub price: Money,
    #[serde(default, skip_serializing)]
    pub payback: Option<Payback>,
}

impl Product {
    pub fn new(name: impl Into<String>, currency: impl Into<String>, price: Money) -> Self {
        Self {
            name: name.into(),
            localized_name: BTreeMap::new(),
            currency: currency.into(),
            price,
            payback: None,
        }
    }

    pub fn with_payback(mut self, account: impl Into<String>, amount: Money) -> Self {
        self.payback = Some(Payback {
            account: account.into(),
            amount,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn client_view_hides_payback() {
        let product = Product::new("Beer", "BEER", Money::parse("3.5").unwrap())
            .with_payback("Liabilities:Bar:Members:Bob", Money::parse("0.5").unwrap());

        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "Beer",
                "localized_name": {},
                "currency": "BEER",
                "price": "3.50",
            })
        );
    }
}
