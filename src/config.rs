use {
    crate::{adapters::coinbase::charges::DEFAULT_STORE_NAME, domain::error::PaymentError},
    std::{env, net::SocketAddr, time::Duration},
};

pub const DEFAULT_API_URL: &str = "https://api.commerce.coinbase.com";
pub const DEFAULT_REDIRECT_URL: &str = "/checkout/onepage/success";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
    pub store_name: String,
    pub redirect_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub outbound_timeout: Duration,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, PaymentError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PaymentError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PaymentError::Validation(format!("{key} must be set")))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs = |key: &str, default: u64| -> Result<Duration, PaymentError> {
            match lookup(key) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|&s| s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        PaymentError::Validation(format!("{key} must be a positive integer"))
                    }),
            }
        };

        let bind_addr = or_default("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .map_err(|e| PaymentError::Validation(format!("BIND_ADDR: {e}")))?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            api_key: required("COINBASE_API_KEY")?,
            api_secret: required("COINBASE_API_SECRET")?,
            api_url: or_default("COINBASE_API_URL", DEFAULT_API_URL),
            store_name: or_default("STORE_NAME", DEFAULT_STORE_NAME),
            redirect_url: or_default("CHECKOUT_REDIRECT_URL", DEFAULT_REDIRECT_URL),
            bind_addr,
            request_timeout: secs("REQUEST_TIMEOUT_SECS", 15)?,
            outbound_timeout: secs("OUTBOUND_TIMEOUT_SECS", 10)?,
        })
    }
}
