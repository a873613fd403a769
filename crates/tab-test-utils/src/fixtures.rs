//! Seed content for a bar-tab data directory.
//!
//! Balances after loading:
//!
//! | account | EUR |
//! |---|---|
//! | `Liabilities:Bar:Members:Alice` | -20.00 |
//! | `Liabilities:Bar:Members:Bob` | -5.00 |
//! | `Assets:Cash:Bar` | 10.00 |
//!
//! `Carol` is opened but never posted to, so she has no computed balance.

use std::fs;
use std::path::Path;

pub const ALICE: &str = "Liabilities:Bar:Members:Alice";
pub const BOB: &str = "Liabilities:Bar:Members:Bob";
pub const CAROL: &str = "Liabilities:Bar:Members:Carol";
pub const CASH: &str = "Assets:Cash:Bar";
pub const INCOME: &str = "Income:Bar";

pub const MASTER_LEDGER: &str = r#"option "title" "Test bar"
option "operating_currency" "EUR"

include "ledger/dynamic.ledger"

2020-01-01 open Assets:Cash:Bar EUR
2020-01-01 open Assets:Inventory:Bar
2020-01-01 open Income:Bar EUR
2020-01-01 open Equity:Opening-Balances
2020-01-01 open Liabilities:Bar:Members:Alice
  display_name: "Alice A."
2020-01-01 open Liabilities:Bar:Members:Bob
2020-01-01 open Liabilities:Bar:Members:Carol

2020-01-02 txn "Opening balances"
  Liabilities:Bar:Members:Alice  -20.00 EUR
  Liabilities:Bar:Members:Bob     -5.00 EUR
  Assets:Cash:Bar                 10.00 EUR
  Equity:Opening-Balances
"#;

pub const DYNAMIC_INCLUDES: &str = "; instance ledgers are registered below\n";

/// Club-Mate has no payback; Beer pays 0.50 per unit back to Bob.
pub const PRODUCTS: &str = r#"- name: Club-Mate
  localized_name:
    en: Club-Mate
    nl: Club-Mate
  currency: MATE
  price: 3.50
- name: Beer
  localized_name:
    en: Beer
    nl: Bier
  currency: BEER
  price: "3.50"
  payback:
    account: Liabilities:Bar:Members:Bob
    amount: 0.50
"#;

/// Write the seed files into `root`.
///
/// # Panics
/// Panics if any write fails.
pub fn write_data_dir(root: &Path) {
    let write = |rel: &str, content: &str| {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_data_dir: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_data_dir: failed to write {}: {e}", path.display()));
    };

    write("bartab.ledger", MASTER_LEDGER);
    write("ledger/dynamic.ledger", DYNAMIC_INCLUDES);
    write("static/products.yml", PRODUCTS);
}
