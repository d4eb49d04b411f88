use {
    super::event::TimelineStatus,
    super::id::{ChargeCode, IncrementId},
    chrono::{DateTime, Utc},
};

/// One row of the charge ledger: which processor charge belongs to which
/// store order. The charge code never changes once written.
#[derive(Debug, Clone)]
pub struct ChargeLedgerEntry {
    pub id: i32,
    pub store_order_id: IncrementId,
    pub charge_code: ChargeCode,
    pub last_status: Option<TimelineStatus>,
    pub last_status_at: Option<DateTime<Utc>>,
}

impl ChargeLedgerEntry {
    pub fn corroborates(&self, code: &ChargeCode) -> bool {
        self.charge_code == *code
    }
}
