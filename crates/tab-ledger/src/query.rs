//! Balance aggregation over loaded entries.

use std::collections::BTreeMap;

use crate::amount::Inventory;
use crate::entry::Entry;

/// Parent of a `:`-separated account name.
///
/// `parent("Liabilities:Bar:Members:Alice") == Some("Liabilities:Bar:Members")`
pub fn parent(account: &str) -> Option<&str> {
    account.rfind(':').map(|idx| &account[..idx])
}

/// Sum every posting per account, keeping only accounts `filter` accepts.
///
/// Equivalent to `select account, sum(position) group by account`. Only
/// accounts with at least one posting appear; an account whose postings
/// cancel out maps to an empty inventory.
pub fn aggregate_balances<F>(entries: &[Entry], filter: F) -> BTreeMap<String, Inventory>
where
    F: Fn(&str) -> bool,
{
    let mut balances: BTreeMap<String, Inventory> = BTreeMap::new();
    for entry in entries {
        let Entry::Transaction(txn) = entry else {
            continue;
        };
        for posting in &txn.postings {
            if !filter(&posting.account) {
                continue;
            }
            let inventory = balances.entry(posting.account.clone()).or_default();
            if let Some(units) = &posting.units {
                inventory.add_amount(units);
            }
        }
    }
    balances
}
