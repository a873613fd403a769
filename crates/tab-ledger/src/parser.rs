use std::str::FromStr;

use chrono::NaiveDate;
use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;
use rust_decimal::Decimal;

use crate::amount::Amount;
use crate::entry::{Close, Entry, Meta, Open, Posting, Transaction};
use crate::error::{LedgerError, Location};

#[derive(Parser)]
#[grammar = "ledger.pest"]
struct LedgerParser;

/// A top-level item of one ledger file, in file order.
#[derive(Debug)]
pub(crate) enum Directive {
    Include { path: String, at: Location },
    Option { name: String, value: String },
    Entry(Entry),
}

/// Parse one file's content.
///
/// A syntax error rejects the whole file; semantic problems inside an
/// otherwise well-formed directive are collected into the returned errors.
pub(crate) fn parse_source(
    content: &str,
    file: &str,
) -> Result<(Vec<Directive>, Vec<LedgerError>), LedgerError> {
    let mut pairs = LedgerParser::parse(Rule::ledger, content).map_err(|e| {
        let line = match e.line_col {
            LineColLocation::Pos((line, _)) | LineColLocation::Span((line, _), _) => line,
        };
        LedgerError::Syntax {
            at: Location::new(file, line),
            message: e.variant.message().into_owned(),
        }
    })?;

    let mut directives = Vec::new();
    let mut errors = Vec::new();
    let Some(ledger) = pairs.next() else {
        return Ok((directives, errors));
    };

    for pair in ledger.into_inner() {
        let at = Location::new(file, pair.as_span().start_pos().line_col().0);
        let parsed = match pair.as_rule() {
            Rule::include => Ok(pair
                .into_inner()
                .next()
                .map(|path| Directive::Include {
                    path: string_value(path),
                    at: at.clone(),
                })),
            Rule::option => {
                let mut inner = pair.into_inner();
                match (inner.next(), inner.next()) {
                    (Some(name), Some(value)) => Ok(Some(Directive::Option {
                        name: string_value(name),
                        value: string_value(value),
                    })),
                    _ => Err(LedgerError::invalid(&at, "option needs a name and a value")),
                }
            }
            Rule::open => parse_open(pair, &at).map(|o| Some(Directive::Entry(Entry::Open(o)))),
            Rule::close => parse_close(pair, &at).map(|c| Some(Directive::Entry(Entry::Close(c)))),
            Rule::transaction => {
                parse_transaction(pair, &at).map(|t| Some(Directive::Entry(Entry::Transaction(t))))
            }
            // plugins and unsupported dated directives carry nothing we use
            _ => Ok(None),
        };

        match parsed {
            Ok(Some(directive)) => directives.push(directive),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    Ok((directives, errors))
}

/// `input` is exactly one `rule` token, nothing more.
fn matches_whole(rule: Rule, input: &str) -> bool {
    LedgerParser::parse(rule, input)
        .ok()
        .and_then(|mut pairs| pairs.next())
        .is_some_and(|pair| pair.as_str().len() == input.len())
}

/// `account` can be written to and read back from a ledger file.
pub fn is_account(account: &str) -> bool {
    matches_whole(Rule::account, account)
}

/// Upper-case currency or commodity name, such as `EUR` or `MATE`.
pub fn is_currency(currency: &str) -> bool {
    matches_whole(Rule::currency, currency)
}

pub fn is_meta_key(key: &str) -> bool {
    matches_whole(Rule::key, key)
}

fn parse_date(pair: Pair<'_, Rule>, at: &Location) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(pair.as_str(), "%Y-%m-%d")
        .map_err(|e| LedgerError::invalid(at, format!("invalid date '{}': {e}", pair.as_str())))
}

fn parse_number(raw: &str, at: &Location) -> Result<Decimal, LedgerError> {
    Decimal::from_str(raw.trim_start_matches('+'))
        .map_err(|e| LedgerError::invalid(at, format!("invalid number '{raw}': {e}")))
}

fn parse_meta(pair: Pair<'_, Rule>, meta: &mut Meta) {
    let mut inner = pair.into_inner();
    if let (Some(key), Some(value)) = (inner.next(), inner.next()) {
        let value = match value.as_rule() {
            Rule::string => string_value(value),
            _ => value.as_str().trim().to_string(),
        };
        meta.insert(key.as_str().to_string(), value);
    }
}

fn parse_open(pair: Pair<'_, Rule>, at: &Location) -> Result<Open, LedgerError> {
    let mut open = Open {
        date: NaiveDate::MIN,
        account: String::new(),
        currencies: Vec::new(),
        meta: Meta::new(),
        location: Some(at.clone()),
    };

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::date => open.date = parse_date(part, at)?,
            Rule::account => open.account = part.as_str().to_string(),
            Rule::currencies => {
                open.currencies = part.into_inner().map(|c| c.as_str().to_string()).collect()
            }
            Rule::metadata => parse_meta(part, &mut open.meta),
            _ => {}
        }
    }

    Ok(open)
}

fn parse_close(pair: Pair<'_, Rule>, at: &Location) -> Result<Close, LedgerError> {
    let mut close = Close {
        date: NaiveDate::MIN,
        account: String::new(),
        meta: Meta::new(),
        location: Some(at.clone()),
    };

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::date => close.date = parse_date(part, at)?,
            Rule::account => close.account = part.as_str().to_string(),
            Rule::metadata => parse_meta(part, &mut close.meta),
            _ => {}
        }
    }

    Ok(close)
}

fn parse_transaction(pair: Pair<'_, Rule>, at: &Location) -> Result<Transaction, LedgerError> {
    let mut txn = Transaction::new(NaiveDate::MIN, "");
    txn.location = Some(at.clone());
    let mut strings = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::date => txn.date = parse_date(part, at)?,
            Rule::flag => {
                txn.flag = match part.as_str() {
                    "!" => '!',
                    _ => '*',
                }
            }
            Rule::string => strings.push(string_value(part)),
            Rule::metadata => parse_meta(part, &mut txn.meta),
            Rule::posting => txn.postings.push(parse_posting(part, at)?),
            _ => {}
        }
    }

    match strings.len() {
        0 => {}
        1 => txn.narration = strings.remove(0),
        2 => {
            txn.narration = strings.remove(1);
            txn.payee = Some(strings.remove(0));
        }
        n => {
            return Err(LedgerError::invalid(
                at,
                format!("transaction header has {n} strings, expected at most 2"),
            ));
        }
    }

    Ok(txn)
}

fn parse_posting(pair: Pair<'_, Rule>, at: &Location) -> Result<Posting, LedgerError> {
    let line = pair.as_span().start_pos().line_col().0;
    let at = Location::new(at.file.clone(), line);
    let mut account = String::new();
    let mut units = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::account => account = part.as_str().to_string(),
            Rule::amount => {
                let mut inner = part.into_inner();
                match (inner.next(), inner.next()) {
                    (Some(number), Some(currency)) => {
                        units = Some(Amount::new(
                            parse_number(number.as_str(), &at)?,
                            currency.as_str(),
                        ));
                    }
                    _ => return Err(LedgerError::invalid(&at, "posting amount is incomplete")),
                }
            }
            _ => {}
        }
    }

    Ok(Posting { account, units })
}

/// Unescape the text of a `string` pair.
fn string_value(pair: Pair<'_, Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|text| text.as_str())
        .unwrap_or("");

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn parse(content: &str) -> Vec<Directive> {
        let (directives, errors) = parse_source(content, "test.ledger").unwrap();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        directives
    }

    #[test]
    fn parses_open_with_metadata() {
        let directives = parse(
            "2020-01-01 open Liabilities:Bar:Members:Alice EUR\n  display_name: \"Alice A.\"\n",
        );
        let [Directive::Entry(Entry::Open(open))] = directives.as_slice() else {
            panic!("expected one open, got {directives:?}");
        };
        assert_eq!(open.account, "Liabilities:Bar:Members:Alice");
        assert_eq!(open.currencies, vec!["EUR".to_string()]);
        assert_eq!(open.meta.get("display_name").map(String::as_str), Some("Alice A."));
    }

    #[test]
    fn parses_transaction_with_payee_and_elided_posting() {
        let directives = parse(concat!(
            "2021-03-04 * \"Shop\" \"Crates\" ; trailing comment\n",
            "  type: purchase\n",
            "  ; a note between postings\n",
            "  Assets:Inventory:Bar   -2 MATE\n",
            "  Income:Bar\n",
        ));
        let [Directive::Entry(Entry::Transaction(txn))] = directives.as_slice() else {
            panic!("expected one transaction, got {directives:?}");
        };
        assert_eq!(txn.payee.as_deref(), Some("Shop"));
        assert_eq!(txn.narration, "Crates");
        assert_eq!(txn.meta.get("type").map(String::as_str), Some("purchase"));
        assert_eq!(txn.postings.len(), 2);
        assert_eq!(
            txn.postings[0].units,
            Some(Amount::new(dec!(-2), "MATE"))
        );
        assert_eq!(txn.postings[1].units, None);
    }

    #[test]
    fn parses_include_and_option_and_skips_other_directives() {
        let directives = parse(concat!(
            "option \"operating_currency\" \"EUR\"\n",
            "plugin \"beancount.plugins.auto\"\n",
            "\n",
            "# section header\n",
            "include \"ledger/dynamic.ledger\"\n",
            "2020-01-01 commodity EUR\n",
            "2020-01-05 balance Assets:Cash:Bar 10.00 EUR\n",
        ));
        assert_eq!(directives.len(), 2);
        assert!(matches!(
            &directives[0],
            Directive::Option { name, value } if name == "operating_currency" && value == "EUR"
        ));
        assert!(matches!(
            &directives[1],
            Directive::Include { path, .. } if path == "ledger/dynamic.ledger"
        ));
    }

    #[test]
    fn escaped_quotes_survive() {
        let directives = parse("2020-01-01 txn \"Say \\\"cheers\\\"\"\n");
        let [Directive::Entry(Entry::Transaction(txn))] = directives.as_slice() else {
            panic!("expected one transaction");
        };
        assert_eq!(txn.narration, "Say \"cheers\"");
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = parse_source(
            "2020-01-01 open Assets:Cash:Bar\nthis is not ledger text\n",
            "bad.ledger",
        )
        .unwrap_err();
        let LedgerError::Syntax { at, .. } = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert_eq!(at, Location::new("bad.ledger", 2));
    }

    #[test]
    fn impossible_date_is_collected_not_fatal() {
        let (directives, errors) = parse_source(
            "2020-02-30 open Assets:Cash:Bar\n2020-01-01 open Income:Bar\n",
            "dates.ledger",
        )
        .unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn names_are_checked_against_the_grammar() {
        assert!(is_account("Liabilities:Bar:Members:Alice"));
        assert!(is_account("Assets:Cash:Bar"));
        assert!(!is_account("Expenses"));
        assert!(!is_account("Assets:Cash Bar"));
        assert!(!is_account("Bar:Members:Alice"));

        assert!(is_currency("EUR"));
        assert!(is_currency("CLUB-MATE"));
        assert!(!is_currency("Cider"));
        assert!(!is_currency(""));

        assert!(is_meta_key("display_name"));
        assert!(!is_meta_key("Order"));
        assert!(!is_meta_key("order id"));
    }

    #[test]
    fn file_without_trailing_newline_parses() {
        let directives = parse("2020-01-01 open Assets:Cash:Bar");
        assert_eq!(directives.len(), 1);
    }
}
