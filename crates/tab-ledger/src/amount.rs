use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;

/// A number of units of one currency or commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub number: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(number: Decimal, currency: impl Into<String>) -> Self {
        Self {
            number,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

/// Per-currency tolerance used when deciding whether a residual is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tolerances {
    by_currency: BTreeMap<String, Decimal>,
}

impl Tolerances {
    /// Tolerance for `currency`; exact (zero) when nothing was inferred.
    pub fn get(&self, currency: &str) -> Decimal {
        self.by_currency
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Raise the tolerance for `currency` to at least `tolerance`.
    pub fn widen(&mut self, currency: &str, tolerance: Decimal) {
        let entry = self
            .by_currency
            .entry(currency.to_string())
            .or_insert(tolerance);
        if tolerance > *entry {
            *entry = tolerance;
        }
    }
}

/// Multi-currency balance.
///
/// Currencies whose units sum to exactly zero are dropped, so an empty
/// inventory means "nothing held".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    units: BTreeMap<String, Decimal>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_amount(&mut self, amount: &Amount) {
        self.add(&amount.currency, amount.number);
    }

    pub fn add(&mut self, currency: &str, number: Decimal) {
        let total = self.units(currency) + number;
        if total.is_zero() {
            self.units.remove(currency);
        } else {
            self.units.insert(currency.to_string(), total);
        }
    }

    /// Units held of `currency` (zero when absent).
    pub fn units(&self, currency: &str) -> Decimal {
        self.units.get(currency).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// True when every currency is within its tolerance of zero.
    pub fn is_small(&self, tolerances: &Tolerances) -> bool {
        self.units
            .iter()
            .all(|(currency, number)| number.abs() <= tolerances.get(currency))
    }

    pub fn iter(&self) -> impl Iterator<Item = Amount> + '_ {
        self.units
            .iter()
            .map(|(currency, number)| Amount::new(*number, currency.clone()))
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|a| a.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}
