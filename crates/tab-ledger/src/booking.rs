//! Balancing rules for transactions.

use rust_decimal::Decimal;

use crate::amount::{Amount, Inventory, Tolerances};
use crate::entry::{Posting, Transaction};

/// Sum of all posting units, per currency.
///
/// Postings without units are ignored.
pub fn compute_residual(postings: &[Posting]) -> Inventory {
    let mut residual = Inventory::new();
    for units in postings.iter().filter_map(|p| p.units.as_ref()) {
        residual.add_amount(units);
    }
    residual
}

/// Infer per-currency tolerances from the precision of the numbers used.
///
/// A number written with `n` fractional digits tolerates half of its last
/// digit (`7.00 EUR` tolerates 0.005). Integers infer nothing, so integer
/// quantities must balance exactly. The widest tolerance seen for a
/// currency wins.
pub fn infer_tolerances(postings: &[Posting]) -> Tolerances {
    let mut tolerances = Tolerances::default();
    for units in postings.iter().filter_map(|p| p.units.as_ref()) {
        let scale = units.number.scale();
        if scale > 0 {
            let half_unit = Decimal::new(5, scale + 1);
            tolerances.widen(&units.currency, half_unit);
        }
    }
    tolerances
}

/// Fill in a posting left without an amount, then check the balance.
///
/// The elided posting absorbs the residual of every currency, one posting
/// per currency. Returns a description of the problem when there is more
/// than one elided posting or the result does not balance.
pub(crate) fn complete(txn: &mut Transaction) -> Result<(), String> {
    let missing: Vec<usize> = txn
        .postings
        .iter()
        .enumerate()
        .filter(|(_, p)| p.units.is_none())
        .map(|(i, _)| i)
        .collect();

    match missing.as_slice() {
        [] => {}
        [index] => {
            let residual = compute_residual(&txn.postings);
            let account = txn.postings.remove(*index).account;
            let fills: Vec<Posting> = residual
                .iter()
                .map(|amount| Posting {
                    account: account.clone(),
                    units: Some(Amount::new(-amount.number, amount.currency)),
                })
                .collect();
            for (offset, fill) in fills.into_iter().enumerate() {
                txn.postings.insert(index + offset, fill);
            }
        }
        _ => return Err("more than one posting has no amount".to_string()),
    }

    let residual = compute_residual(&txn.postings);
    if residual.is_small(&infer_tolerances(&txn.postings)) {
        Ok(())
    } else {
        Err(format!("transaction does not balance: residual {residual}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn txn(postings: Vec<Posting>) -> Transaction {
        let mut txn = Transaction::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), "t");
        txn.postings = postings;
        txn
    }

    #[test]
    fn tolerance_is_half_the_last_digit() {
        let postings = vec![
            Posting::new("Income:Bar", dec!(-7.00), "EUR"),
            Posting::new("Assets:Inventory:Bar", dec!(-2), "MATE"),
        ];
        let tolerances = infer_tolerances(&postings);
        assert_eq!(tolerances.get("EUR"), dec!(0.005));
        assert_eq!(tolerances.get("MATE"), Decimal::ZERO);
    }

    #[test]
    fn elided_posting_absorbs_every_currency() {
        let mut t = txn(vec![
            Posting::new("Assets:Cash:Bar", dec!(10.00), "EUR"),
            Posting::new("Assets:Inventory:Bar", dec!(3), "MATE"),
            Posting {
                account: "Equity:Opening-Balances".into(),
                units: None,
            },
        ]);
        complete(&mut t).unwrap();

        assert_eq!(t.postings.len(), 4);
        assert!(compute_residual(&t.postings).is_empty());
        assert!(
            t.postings
                .iter()
                .filter(|p| p.account == "Equity:Opening-Balances")
                .all(|p| p.units.is_some())
        );
    }

    #[test]
    fn two_elided_postings_are_ambiguous() {
        let mut t = txn(vec![
            Posting::new("Assets:Cash:Bar", dec!(10.00), "EUR"),
            Posting {
                account: "Income:Bar".into(),
                units: None,
            },
            Posting {
                account: "Equity:Opening-Balances".into(),
                units: None,
            },
        ]);
        assert!(complete(&mut t).is_err());
    }

    #[test]
    fn rounding_noise_within_tolerance_balances() {
        let mut t = txn(vec![
            Posting::new("Assets:Cash:Bar", dec!(10.004), "EUR"),
            Posting::new("Income:Bar", dec!(-10.00), "EUR"),
        ]);
        assert!(complete(&mut t).is_ok());
    }

    #[test]
    fn real_imbalance_is_reported() {
        let mut t = txn(vec![
            Posting::new("Assets:Cash:Bar", dec!(10.00), "EUR"),
            Posting::new("Income:Bar", dec!(-9.00), "EUR"),
        ]);
        let message = complete(&mut t).unwrap_err();
        assert!(message.contains("1.00 EUR"), "got: {message}");
    }
}
