//! Coinbase Commerce integration: webhook intake and charge creation.

pub mod charges;
pub mod envelope;
pub mod signature;
pub mod webhook;
