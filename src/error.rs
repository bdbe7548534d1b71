//! Error types for wallet operations

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wallet operations
///
/// Every variant is terminal for the call that produced it. Nothing in this
/// crate retries; the caller decides whether to try again.
#[derive(Error, Debug)]
pub enum Error {
    // Token registry errors
    #[error("Unsupported token type: {0}")]
    UnknownToken(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Chain capability errors
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration: {0}")]
    InsufficientConfiguration(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    // Transaction errors
    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error came back from a chain node rather than from local
    /// validation or configuration
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Rpc(_) | Error::Submission(_))
    }

    /// Check if this error is a configuration problem the operator must fix
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InsufficientConfiguration(_)
        )
    }
}
