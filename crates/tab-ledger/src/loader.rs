//! Loading a ledger file and everything it includes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tab_fs::NormalizedPath;

use crate::booking;
use crate::entry::Entry;
use crate::error::{LedgerError, Location};
use crate::parser::{self, Directive};

/// `option` directives in the order they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: Vec<(String, String)>,
}

impl Options {
    /// Last value set for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of loading a ledger.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Entries sorted by date, with elided amounts filled in
    pub entries: Vec<Entry>,
    pub options: Options,
    /// Everything that went wrong; empty for a clean ledger
    pub errors: Vec<LedgerError>,
}

/// Load `path` and every file it includes.
///
/// Include paths are resolved relative to the including file. Never fails:
/// unreadable files, syntax errors and invalid entries are reported in
/// [`Loaded::errors`].
pub fn load_file(path: &NormalizedPath) -> Loaded {
    let mut loader = Loader::default();
    loader.load_path(path, None);
    loader.finish()
}

/// Load ledger text that did not come from a file.
///
/// Includes are resolved relative to `origin`'s directory.
pub fn load_str(content: &str, origin: &NormalizedPath) -> Loaded {
    let mut loader = Loader::default();
    loader.load_content(content, origin);
    loader.finish()
}

#[derive(Default)]
struct Loader {
    entries: Vec<Entry>,
    options: Options,
    errors: Vec<LedgerError>,
    stack: Vec<NormalizedPath>,
    seen: BTreeSet<NormalizedPath>,
}

impl Loader {
    fn load_path(&mut self, path: &NormalizedPath, included_at: Option<&Location>) {
        let canonical = match NormalizedPath::canonical(path) {
            Ok(canonical) => canonical,
            Err(e) => {
                self.errors.push(LedgerError::Unreadable {
                    file: path.to_string(),
                    message: e.to_string(),
                });
                return;
            }
        };

        if let Some(at) = included_at {
            if self.stack.contains(&canonical) {
                self.errors.push(LedgerError::IncludeCycle {
                    at: at.clone(),
                    target: canonical.to_string(),
                });
                return;
            }
            if self.seen.contains(&canonical) {
                self.errors.push(LedgerError::DuplicateInclude {
                    at: at.clone(),
                    target: canonical.to_string(),
                });
                return;
            }
        }

        let content = match tab_fs::io::read_text(&canonical) {
            Ok(content) => content,
            Err(e) => {
                self.errors.push(LedgerError::Unreadable {
                    file: canonical.to_string(),
                    message: e.to_string(),
                });
                return;
            }
        };

        self.seen.insert(canonical.clone());
        self.stack.push(canonical.clone());
        self.load_content(&content, &canonical);
        self.stack.pop();
    }

    fn load_content(&mut self, content: &str, origin: &NormalizedPath) {
        let (directives, errors) = match parser::parse_source(content, origin.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        self.errors.extend(errors);

        for directive in directives {
            match directive {
                Directive::Include { path, at } => {
                    let target = match origin.parent() {
                        Some(dir) if !path.starts_with('/') => dir.join(&path),
                        _ => NormalizedPath::new(&path),
                    };
                    tracing::trace!(from = %origin, include = %target, "Following include");
                    self.load_path(&target, Some(&at));
                }
                Directive::Option { name, value } => self.options.values.push((name, value)),
                Directive::Entry(entry) => self.entries.push(entry),
            }
        }
    }

    fn finish(mut self) -> Loaded {
        self.entries.sort_by_key(|e| (e.date(), e.sort_rank()));
        validate(&mut self.entries, &mut self.errors);
        Loaded {
            entries: self.entries,
            options: self.options,
            errors: self.errors,
        }
    }
}

/// Interpolate and balance-check transactions, and make sure every posting
/// hits an account that is open on the transaction date.
fn validate(entries: &mut [Entry], errors: &mut Vec<LedgerError>) {
    let mut opened: BTreeMap<String, NaiveDate> = BTreeMap::new();
    let mut closed: BTreeMap<String, NaiveDate> = BTreeMap::new();
    let unknown = Location::new("<unknown>", 0);

    for entry in entries.iter() {
        match entry {
            Entry::Open(open) => {
                if opened.insert(open.account.clone(), open.date).is_some() {
                    errors.push(LedgerError::invalid(
                        open.location.as_ref().unwrap_or(&unknown),
                        format!("account {} is opened twice", open.account),
                    ));
                }
            }
            Entry::Close(close) => {
                closed.insert(close.account.clone(), close.date);
            }
            Entry::Transaction(_) => {}
        }
    }

    for entry in entries.iter_mut() {
        let Entry::Transaction(txn) = entry else {
            continue;
        };
        let at = txn.location.clone().unwrap_or_else(|| unknown.clone());

        if let Err(message) = booking::complete(txn) {
            errors.push(LedgerError::invalid(&at, message));
        }

        for posting in &txn.postings {
            match opened.get(&posting.account) {
                None => errors.push(LedgerError::invalid(
                    &at,
                    format!("account {} is not open", posting.account),
                )),
                Some(date) if *date > txn.date => errors.push(LedgerError::invalid(
                    &at,
                    format!("account {} is not open until {date}", posting.account),
                )),
                _ => {}
            }
            if let Some(date) = closed.get(&posting.account)
                && *date < txn.date
            {
                errors.push(LedgerError::invalid(
                    &at,
                    format!("account {} was closed on {date}", posting.account),
                ));
            }
        }
    }
}
