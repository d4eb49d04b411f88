use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("webhook signature mismatch")]
    Authentication,

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("charge creation failed: {0}")]
    ChargeCreationFailed(String),

    #[error("checkout unavailable: {0}")]
    CheckoutUnavailable(String),

    #[error("concurrent reconciliation conflict: {0}")]
    Conflict(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaymentError {
    /// `lock_not_available`, raised when `lock_timeout` elapses while waiting
    /// for the per-order advisory lock.
    pub fn is_lock_timeout(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.code().as_deref() == Some("55P03"),
            _ => false,
        }
    }
}
