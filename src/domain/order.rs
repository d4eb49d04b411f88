use {
    super::error::PaymentError,
    super::id::IncrementId,
    super::money::{Amount, CurrencyCode, Money},
    serde::Serialize,
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Holded,
    Canceled,
    Processing,
    Complete,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Holded => "holded",
            Self::Canceled => "canceled",
            Self::Processing => "processing",
            Self::Complete => "complete",
        }
    }

    pub fn can_hold(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Canceled and complete orders are final; a payment never reopens them.
    pub fn can_capture(&self) -> bool {
        matches!(self, Self::Pending | Self::Holded | Self::Processing)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for OrderState {
    type Error = PaymentError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "holded" => Ok(Self::Holded),
            "canceled" => Ok(Self::Canceled),
            "processing" => Ok(Self::Processing),
            "complete" => Ok(Self::Complete),
            other => Err(PaymentError::Validation(format!(
                "unknown order state: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
}

/// Payment sub-record of an order. Empty until a capture is registered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderPayment {
    pub transaction_id: Option<String>,
    pub currency_code: Option<String>,
    pub amount_captured: Option<String>,
    pub parent_transaction_closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub increment_id: IncrementId,
    pub state: OrderState,
    pub customer: Customer,
    pub grand_total: Money,
    pub email_sent: bool,
    pub payment: OrderPayment,
}

/// For INSERT. The id is generated in Rust via Uuid::now_v7().
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub increment_id: IncrementId,
    pub customer: Customer,
    pub grand_total: Money,
}

impl NewOrder {
    pub fn new(
        increment_id: IncrementId,
        customer: Customer,
        amount: Amount,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            increment_id,
            customer,
            grand_total: Money::new(amount, currency),
        }
    }
}

/// Comment appended to an order's status history.
#[derive(Debug, Clone)]
pub struct HistoryComment {
    pub comment: String,
    pub status: Option<OrderState>,
    /// `None` means "not applicable", distinct from "not notified".
    pub is_customer_notified: Option<bool>,
}

impl HistoryComment {
    pub fn ipn(status: &str, detail: &str) -> Self {
        let mut comment = format!("IPN \"{status}\"");
        if !detail.is_empty() {
            comment.push(' ');
            comment.push_str(detail);
        }
        Self {
            comment,
            status: None,
            is_customer_notified: None,
        }
    }

    pub fn invoice_notified(invoice: &Invoice) -> Self {
        Self {
            comment: format!(
                "You notified customer about invoice #{}.",
                invoice.increment_id
            ),
            status: None,
            is_customer_notified: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: Uuid,
    pub increment_id: String,
}

/// Capture notification registered against an order's payment.
#[derive(Debug, Clone)]
pub struct Capture {
    pub transaction_id: String,
    pub money: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Registered(Invoice),
    /// The order already carries a captured payment.
    AlreadyCaptured,
}

/// Permission to delete an order outside the normal authorization path.
///
/// Only [`SecureArea::enter`] creates one and deleting consumes it, so the
/// privilege lives exactly as long as a single delete call.
#[derive(Debug)]
pub struct SecureArea {
    reason: &'static str,
}

impl SecureArea {
    pub fn enter(reason: &'static str) -> Self {
        tracing::debug!(reason, "entering secure area");
        Self { reason }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}
