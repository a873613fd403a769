//! Member accounts

use tab_ledger::Inventory;

use crate::money::Money;
use crate::{Error, Result};

/// The bar's own cash drawer, treated as a member.
pub const CASH_ACCOUNT: &str = "Assets:Cash:Bar";

/// Parent of every regular member account.
pub const MEMBERS_PARENT: &str = "Liabilities:Bar:Members";

pub const INVENTORY_ACCOUNT: &str = "Assets:Inventory:Bar";
pub const INCOME_ACCOUNT: &str = "Income:Bar";

const CASH_INTERNAL_NAME: &str = "--cash--";
const CASH_DISPLAY_NAME: &str = "--CASH--";

/// A ledger account that can buy, transfer and deposit.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub internal_name: String,
    pub display_name: String,
    pub account: String,
    pub balance: Inventory,
}

impl Member {
    /// Build a member with an empty balance.
    ///
    /// `account` must be [`CASH_ACCOUNT`] or have exactly four components,
    /// e.g. `Liabilities:Bar:Members:Alice`.
    pub fn new(account: &str) -> Result<Self> {
        let (internal_name, display_name) = if account == CASH_ACCOUNT {
            (CASH_INTERNAL_NAME.to_string(), CASH_DISPLAY_NAME.to_string())
        } else {
            let parts: Vec<&str> = account.split(':').collect();
            if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
                return Err(Error::InvalidAccount {
                    account: account.to_string(),
                    reason: "member accounts have four components".into(),
                });
            }
            let name = parts[3].to_string();
            (name.clone(), name)
        };

        Ok(Self {
            internal_name,
            display_name,
            account: account.to_string(),
            balance: Inventory::new(),
        })
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_balance(mut self, balance: Inventory) -> Self {
        self.balance = balance;
        self
    }

    /// Balance in `currency`, quantized to two decimals.
    pub fn balance_in(&self, currency: &str) -> Money {
        Money::from_decimal(self.balance.units(currency))
    }
}
