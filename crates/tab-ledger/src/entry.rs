use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::amount::Amount;
use crate::error::Location;

/// Key/value metadata attached to a directive.
pub type Meta = BTreeMap<String, String>;

/// `open` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    pub date: NaiveDate,
    pub account: String,
    pub currencies: Vec<String>,
    pub meta: Meta,
    pub location: Option<Location>,
}

/// `close` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Close {
    pub date: NaiveDate,
    pub account: String,
    pub meta: Meta,
    pub location: Option<Location>,
}

/// One leg of a transaction.
///
/// `units` is `None` only for a freshly parsed posting whose amount is left
/// for the loader to interpolate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub units: Option<Amount>,
}

impl Posting {
    pub fn new(account: impl Into<String>, number: Decimal, currency: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            units: Some(Amount::new(number, currency)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub flag: char,
    pub payee: Option<String>,
    pub narration: String,
    pub meta: Meta,
    pub postings: Vec<Posting>,
    pub location: Option<Location>,
}

impl Transaction {
    /// A completed (`*`) transaction without postings.
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            date,
            flag: '*',
            payee: None,
            narration: narration.into(),
            meta: Meta::new(),
            postings: Vec::new(),
            location: None,
        }
    }

    /// Append a posting of `number` units of `currency` to `account`.
    pub fn add_posting(&mut self, account: impl Into<String>, number: Decimal, currency: impl Into<String>) {
        self.postings.push(Posting::new(account, number, currency));
    }
}

/// A dated ledger directive the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Open(Open),
    Close(Close),
    Transaction(Transaction),
}

impl Entry {
    pub fn date(&self) -> NaiveDate {
        match self {
            Entry::Open(open) => open.date,
            Entry::Close(close) => close.date,
            Entry::Transaction(txn) => txn.date,
        }
    }

    /// Same-day ordering: accounts open before they are used and close after.
    pub(crate) fn sort_rank(&self) -> u8 {
        match self {
            Entry::Open(_) => 0,
            Entry::Transaction(_) => 1,
            Entry::Close(_) => 2,
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Entry::Open(open) => open.location.as_ref(),
            Entry::Close(close) => close.location.as_ref(),
            Entry::Transaction(txn) => txn.location.as_ref(),
        }
    }
}
