//! Error types for tab-git

/// Result type for tab-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tab-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a git repository: .git not found at {path}")]
    NotARepository { path: String },

    #[error("Failed to run `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Failed to reset to {revision}: {message}")]
    ResetFailed { revision: String, message: String },
}
