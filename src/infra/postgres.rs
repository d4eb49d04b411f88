pub mod event_repo;
pub mod ledger_repo;
pub mod order_repo;
