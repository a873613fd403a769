//! Error types for tab-core

/// Result type for tab-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tab-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Data could not be brought up to date, or a change could not be made durable
    #[error("Update failed: {message}")]
    UpdateFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Account path does not name a member
    #[error("Invalid member account {account}: {reason}")]
    InvalidAccount { account: String, reason: String },

    /// Transaction built without a title
    #[error("A transaction must have a title")]
    MissingTitle,

    /// Transaction the ledger grammar could not read back
    #[error("Invalid transaction: {message}")]
    InvalidTransaction { message: String },

    /// Two catalog entries share a name
    #[error("Duplicate product {name}")]
    DuplicateProduct { name: String },

    /// Catalog document has the wrong shape
    #[error("Invalid product catalog: {message}")]
    Catalog { message: String },

    /// Monetary amount that cannot be parsed
    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    /// Instance log candidate already exists; retried internally
    #[error("Instance ledger {name} already exists")]
    NameCollision { name: String },

    /// The compensating reset after a failed update failed too
    #[error("Rollback to {revision} failed ({reset}) after: {original}")]
    RollbackFailed {
        revision: String,
        original: Box<Error>,
        reset: tab_git::Error,
    },

    /// Instance log used before it was opened
    #[error("Instance ledger is not open")]
    InstanceLogClosed,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from tab-fs
    #[error(transparent)]
    Fs(#[from] tab_fs::Error),

    /// Git error from tab-git
    #[error(transparent)]
    Git(#[from] tab_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap `cause` in [`Error::UpdateFailed`], leaving an existing
    /// `UpdateFailed` untouched.
    pub fn update_failed(message: impl Into<String>, cause: Error) -> Self {
        match cause {
            already @ Error::UpdateFailed { .. } => already,
            other => Error::UpdateFailed {
                message: message.into(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// The data could not be brought up to date or a change was not made
    /// durable. A failed rollback counts: the update failed before it.
    pub fn is_update_failed(&self) -> bool {
        matches!(
            self,
            Error::UpdateFailed { .. } | Error::RollbackFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_failed_is_not_double_wrapped() {
        let inner = Error::UpdateFailed {
            message: "Failed to load ledger".into(),
            source: None,
        };
        let wrapped = Error::update_failed("Failed to reload data", inner);

        assert_eq!(wrapped.to_string(), "Update failed: Failed to load ledger");
    }

    #[test]
    fn update_failed_keeps_cause() {
        let wrapped = Error::update_failed(
            "Failed to reload data",
            Error::DuplicateProduct {
                name: "Beer".into(),
            },
        );

        let source = std::error::Error::source(&wrapped).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Duplicate product Beer"));
    }

    #[test]
    fn failed_rollback_is_an_update_failure() {
        let err = Error::RollbackFailed {
            revision: "abc123".into(),
            original: Box::new(Error::InstanceLogClosed),
            reset: tab_git::Error::ResetFailed {
                revision: "abc123".into(),
                message: "locked".into(),
            },
        };

        assert!(err.is_update_failed());
        assert!(!Error::MissingTitle.is_update_failed());
    }
}
