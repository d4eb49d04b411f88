use {
    super::error::PaymentError,
    super::id::{ChargeCode, EventId, IncrementId},
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Webhook `event.type`. Types this engine has no rule for still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum EventType {
    #[serde(rename = "charge:created")]
    Created,

    #[serde(rename = "charge:confirmed")]
    Confirmed,

    #[serde(rename = "charge:failed")]
    Failed,

    #[serde(rename = "charge:delayed")]
    Delayed,

    #[serde(rename = "charge:pending")]
    Pending,

    #[serde(rename = "charge:resolved")]
    Resolved,

    #[serde(other)]
    Unknown,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "charge:created",
            Self::Confirmed => "charge:confirmed",
            Self::Failed => "charge:failed",
            Self::Delayed => "charge:delayed",
            Self::Pending => "charge:pending",
            Self::Resolved => "charge:resolved",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a charge timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineStatus {
    New,
    Pending,
    Completed,
    Unresolved,
    Expired,
    Canceled,
    Resolved,

    /// A status this engine does not know. Never recorded, never acted on.
    #[serde(other)]
    Unknown,
}

impl TimelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Unresolved => "UNRESOLVED",
            Self::Expired => "EXPIRED",
            Self::Canceled => "CANCELED",
            Self::Resolved => "RESOLVED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Lifecycle rank, higher means further along. A recorded status is
    /// never replaced by one of lower rank.
    pub fn rank(&self) -> u8 {
        match self {
            Self::New | Self::Unknown => 0,
            Self::Pending => 1,
            Self::Unresolved => 2,
            Self::Completed | Self::Expired | Self::Canceled | Self::Resolved => 3,
        }
    }

    /// Whether an event carrying `self` may be applied on top of `recorded`.
    pub fn may_follow(&self, recorded: &TimelineStatus) -> StatusOrder {
        match self.rank().cmp(&recorded.rank()) {
            std::cmp::Ordering::Less => StatusOrder::Regression,
            std::cmp::Ordering::Equal if self != recorded => StatusOrder::Conflicting,
            std::cmp::Ordering::Equal => StatusOrder::Same,
            std::cmp::Ordering::Greater => StatusOrder::Advance,
        }
    }
}

impl fmt::Display for TimelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TimelineStatus {
    type Error = PaymentError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "NEW" => Ok(Self::New),
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "UNRESOLVED" => Ok(Self::Unresolved),
            "EXPIRED" => Ok(Self::Expired),
            "CANCELED" => Ok(Self::Canceled),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(PaymentError::Validation(format!(
                "unknown timeline status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOrder {
    Advance,
    Same,
    /// Same rank, different status (COMPLETED vs EXPIRED).
    Conflicting,
    Regression,
}

/// The payment the processor attached to the charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargePayment {
    pub transaction_id: String,
    pub crypto: Money,
    pub network_status: String,
}

/// One webhook delivery reduced to what reconciliation needs.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub event_id: EventId,
    pub increment_id: IncrementId,
    pub charge_code: ChargeCode,
    pub event_type: EventType,
    pub timeline_status: TimelineStatus,
    pub timeline_context: Option<String>,
    pub status_at: DateTime<Utc>,
    pub payment: Option<ChargePayment>,
}
