pub mod checkout;
pub mod reconciler;
