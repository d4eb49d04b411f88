use {
    super::error::PaymentError,
    super::id::IncrementId,
    std::{future::Future, pin::Pin},
};

/// What the customer is told once an invoice exists for their order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceEmail {
    pub increment_id: IncrementId,
    pub invoice_increment_id: String,
    pub customer_name: String,
    pub customer_email: String,
}

pub trait OrderNotifier: Send + Sync {
    fn send_invoice_email(
        &self,
        email: InvoiceEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), PaymentError>> + Send + '_>>;
}

/// Hands the notification to the log; mail delivery belongs to the store.
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn send_invoice_email(
        &self,
        email: InvoiceEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), PaymentError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(
                increment_id = %email.increment_id,
                invoice = %email.invoice_increment_id,
                to = %email.customer_email,
                "invoice email queued"
            );
            Ok(())
        })
    }
}
