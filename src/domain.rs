pub mod error;
pub mod event;
pub mod id;
pub mod ledger;
pub mod money;
pub mod notifier;
pub mod order;
pub mod rules;
