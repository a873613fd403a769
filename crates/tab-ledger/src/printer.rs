//! Rendering entries back to ledger text.

use std::fmt::Write;

use crate::entry::{Meta, Transaction};
use crate::error::LedgerError;

fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

fn write_meta(out: &mut String, meta: &Meta) {
    for (key, value) in meta {
        let _ = writeln!(out, "  {key}: {}", quote(value));
    }
}

/// Render a transaction, followed by a blank separator line.
pub fn print_transaction(txn: &Transaction) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {}", txn.date.format("%Y-%m-%d"), txn.flag);
    if let Some(payee) = &txn.payee {
        let _ = write!(out, " {}", quote(payee));
    }
    let _ = writeln!(out, " {}", quote(&txn.narration));
    write_meta(&mut out, &txn.meta);

    let width = txn
        .postings
        .iter()
        .map(|p| p.account.len())
        .max()
        .unwrap_or(0);
    for posting in &txn.postings {
        match &posting.units {
            Some(units) => {
                let _ = writeln!(out, "  {:<width$}  {units}", posting.account);
            }
            None => {
                let _ = writeln!(out, "  {}", posting.account);
            }
        }
    }
    out.push('\n');
    out
}

/// One error per line.
pub fn print_errors(errors: &[LedgerError]) -> String {
    let mut out = String::new();
    for error in errors {
        let _ = writeln!(out, "{error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::loader::load_str;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tab_fs::NormalizedPath;

    fn sample() -> Transaction {
        let mut txn = Transaction::new(
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            "Alice gave Bob a gift of €2.50",
        );
        txn.meta.insert("type".into(), "transfer".into());
        txn.add_posting("Liabilities:Bar:Members:Alice", dec!(-2.50), "EUR");
        txn.add_posting("Assets:Cash:Bar", dec!(2.50), "EUR");
        txn
    }

    #[test]
    fn prints_aligned_postings() {
        let text = print_transaction(&sample());
        assert_eq!(
            text,
            concat!(
                "2026-10-19 * \"Alice gave Bob a gift of €2.50\"\n",
                "  type: \"transfer\"\n",
                "  Liabilities:Bar:Members:Alice  -2.50 EUR\n",
                "  Assets:Cash:Bar                2.50 EUR\n",
                "\n",
            )
        );
    }

    #[test]
    fn printed_text_loads_back() {
        let text = format!(
            "2020-01-01 open Liabilities:Bar:Members:Alice\n2020-01-01 open Assets:Cash:Bar\n{}",
            print_transaction(&sample())
        );
        let loaded = load_str(&text, &NormalizedPath::new("/nonexistent/inline.ledger"));

        assert!(loaded.errors.is_empty(), "{}", print_errors(&loaded.errors));
        let Some(Entry::Transaction(txn)) = loaded.entries.last() else {
            panic!("expected a transaction last");
        };
        assert_eq!(txn.narration, sample().narration);
        assert_eq!(txn.postings, sample().postings);
    }
}
