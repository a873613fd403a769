//! Balanced transaction construction

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tab_ledger::{
    Meta, Posting, compute_residual, infer_tolerances, is_account, is_currency, is_meta_key,
};

use crate::member::{CASH_ACCOUNT, INCOME_ACCOUNT, INVENTORY_ACCOUNT, Member};
use crate::money::Money;
use crate::product::Product;
use crate::{Error, Result};

/// What a transaction records; stored in the `type` metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnKind {
    Purchase,
    Transfer,
    Deposit,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Transfer => "transfer",
            Self::Deposit => "deposit",
        }
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a transaction happened.
///
/// A full timestamp is reduced to its UTC date; the timestamp itself is kept
/// in the `timestamp` metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnDate {
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl From<NaiveDate> for TxnDate {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for TxnDate {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self::Timestamp(timestamp)
    }
}

/// A ledger transaction produced by the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    entry: tab_ledger::Transaction,
    kind: Option<TxnKind>,
}

impl Transaction {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// `buyer` takes `items` out of inventory and is charged their price.
    ///
    /// Paybacks are credited to their accounts; the rest of the charge goes
    /// to income.
    pub fn purchase(
        buyer: &Member,
        items: &[(Product, u32)],
        currency: &str,
        when: Option<TxnDate>,
    ) -> Result<Self> {
        let mut builder = Self::builder()
            .title(format!("{} bought some stuff", buyer.display_name))
            .kind(TxnKind::Purchase)
            .when(when);

        let mut charge = Money::ZERO;
        let mut paybacks: IndexMap<&str, Money> = IndexMap::new();
        for (product, qty) in items {
            charge += product.price * *qty;
            if let Some(payback) = &product.payback {
                *paybacks.entry(payback.account.as_str()).or_insert(Money::ZERO) +=
                    payback.amount * *qty;
            }
            let units = Decimal::from(*qty);
            builder = builder
                .posting(INVENTORY_ACCOUNT, -units, &product.currency)
                .posting(&buyer.account, units, &product.currency);
        }

        builder = builder.posting(&buyer.account, charge.amount(), currency);
        let mut income = charge;
        for (payee, amount) in paybacks {
            builder = builder.posting(payee, (-amount).amount(), currency);
            income -= amount;
        }
        builder
            .posting(INCOME_ACCOUNT, (-income).amount(), currency)
            .build()
    }

    /// Move `amount` from `payer` to `payee`.
    pub fn transfer(
        payer: &Member,
        payee: &Member,
        amount: Money,
        currency: &str,
        when: Option<TxnDate>,
    ) -> Result<Self> {
        Self::builder()
            .title(format!(
                "{} gave {} a gift of {}",
                payer.display_name,
                payee.display_name,
                format_amount(amount, currency)
            ))
            .kind(TxnKind::Transfer)
            .when(when)
            .posting(&payer.account, (-amount).amount(), currency)
            .posting(&payee.account, amount.amount(), currency)
            .build()
    }

    /// `member` hands `amount` in cash to the bar.
    pub fn deposit(
        member: &Member,
        amount: Money,
        currency: &str,
        when: Option<TxnDate>,
    ) -> Result<Self> {
        Self::builder()
            .title(format!(
                "{} deposited {}",
                member.display_name,
                format_amount(amount, currency)
            ))
            .kind(TxnKind::Deposit)
            .when(when)
            .posting(&member.account, (-amount).amount(), currency)
            .posting(CASH_ACCOUNT, amount.amount(), currency)
            .build()
    }

    pub fn kind(&self) -> Option<TxnKind> {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.entry.narration
    }

    pub fn date(&self) -> NaiveDate {
        self.entry.date
    }

    pub fn meta(&self) -> &Meta {
        &self.entry.meta
    }

    pub fn postings(&self) -> &[Posting] {
        &self.entry.postings
    }

    /// The underlying ledger entry.
    pub fn ledger_entry(&self) -> &tab_ledger::Transaction {
        &self.entry
    }

    /// Postings sum to zero per currency within the inferred tolerance,
    /// which never exceeds half a cent.
    pub fn is_balanced(&self) -> bool {
        let settlement = Decimal::new(5, 3);
        let tolerances = infer_tolerances(&self.entry.postings);
        compute_residual(&self.entry.postings)
            .iter()
            .all(|residual| {
                residual.number.abs() <= tolerances.get(&residual.currency).min(settlement)
            })
    }
}

/// `€7.00` for euros, `7.00 GBP` for anything else.
pub fn format_amount(amount: Money, currency: &str) -> String {
    if currency == "EUR" {
        format!("€{amount}")
    } else {
        format!("{amount} {currency}")
    }
}

#[derive(Debug, Default)]
pub struct TransactionBuilder {
    title: Option<String>,
    when: Option<TxnDate>,
    meta: Meta,
    postings: Vec<Posting>,
    kind: Option<TxnKind>,
}

impl TransactionBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.when = Some(TxnDate::Date(date));
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.when = Some(TxnDate::Timestamp(timestamp));
        self
    }

    /// `None` means now.
    pub fn when(mut self, when: Option<TxnDate>) -> Self {
        self.when = when;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn posting(mut self, account: &str, number: Decimal, currency: &str) -> Self {
        self.postings.push(Posting::new(account, number, currency));
        self
    }

    pub fn kind(mut self, kind: TxnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn build(self) -> Result<Transaction> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(Error::MissingTitle),
        };

        if let Some(key) = self.meta.keys().find(|key| !is_meta_key(key)) {
            return Err(Error::InvalidTransaction {
                message: format!("metadata key '{key}' must start with a lower-case letter"),
            });
        }
        for posting in &self.postings {
            if !is_account(&posting.account) {
                return Err(Error::InvalidTransaction {
                    message: format!("invalid account '{}'", posting.account),
                });
            }
            if let Some(units) = posting.units.as_ref().filter(|u| !is_currency(&u.currency)) {
                return Err(Error::InvalidTransaction {
                    message: format!("invalid currency '{}'", units.currency),
                });
            }
        }

        let mut meta = self.meta;
        let date = match self.when.unwrap_or_else(|| TxnDate::Timestamp(Utc::now())) {
            TxnDate::Date(date) => date,
            TxnDate::Timestamp(timestamp) => {
                meta.insert(
                    "timestamp".into(),
                    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                );
                timestamp.date_naive()
            }
        };
        if let Some(kind) = self.kind {
            meta.insert("type".into(), kind.as_str().into());
        }

        let mut entry = tab_ledger::Transaction::new(date, title);
        entry.meta = meta;
        entry.postings = self.postings;
        Ok(Transaction {
            entry,
            kind: self.kind,
        })
    }
}
