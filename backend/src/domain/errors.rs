use thiserror::Error;

/// Failure modes of the ledger engine.
///
/// Validation failures are returned as typed results and never leave the
/// engine as panics; store failures abort the current unit of work and
/// propagate without automatic retry. Parse no-match and unsafe-input
/// rejection are not errors and do not appear here.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("currency must be specified")]
    MissingCurrency,

    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("amount {amount} exceeds the maximum limit of ±{limit}")]
    AmountOutOfRange { amount: f64, limit: f64 },

    #[error("chat {0} is not registered")]
    ChatNotFound(i64),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}
