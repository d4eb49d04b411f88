use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::PaymentError;

/// Store order increment identifier (`000000086`). Matches the width of
/// `sales_orders.increment_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncrementId(String);

impl IncrementId {
    pub const MAX_LEN: usize = 32;

    pub fn new(id: impl Into<String>) -> Result<Self, PaymentError> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(PaymentError::Validation(format!(
                "IncrementId must be 1..={} chars, got: {id:?}",
                Self::MAX_LEN
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Processor-issued charge code (`EMDWFKFL`).
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargeCode(String);

impl ChargeCode {
    pub const MAX_LEN: usize = 16;

    pub fn new(code: impl Into<String>) -> Result<Self, PaymentError> {
        let code = code.into();
        if code.is_empty()
            || code.len() > Self::MAX_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(PaymentError::Validation(format!(
                "ChargeCode must be 1..={} alphanumeric chars, got: {code:?}",
                Self::MAX_LEN
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Processor event identifier, the dedup key for deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Result<Self, PaymentError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PaymentError::Validation("EventId must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
