use {
    crate::domain::{error::PaymentError, id::ChargeCode, order::Order},
    reqwest::{
        Client,
        header::{CONTENT_TYPE, HeaderMap, HeaderValue},
    },
    serde::Serialize,
    std::time::Duration,
};

pub const API_VERSION: &str = "2018-03-22";
pub const DEFAULT_STORE_NAME: &str = "E-commerce Store";
const DESCRIPTION: &str = "Purchased through Coinbase Commerce";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalPrice {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeMetadata {
    pub id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub store_increment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeRequest {
    pub name: String,
    pub description: String,
    pub local_price: LocalPrice,
    pub pricing_type: &'static str,
    pub metadata: ChargeMetadata,
    pub redirect_url: String,
}

impl ChargeRequest {
    pub fn for_order(order: &Order, store_name: &str, redirect_url: &str) -> Self {
        let name = match store_name.trim() {
            "" => DEFAULT_STORE_NAME,
            name => name,
        };
        Self {
            name: name.to_string(),
            description: DESCRIPTION.to_string(),
            local_price: LocalPrice {
                amount: order.grand_total.amount().to_string(),
                currency: order.grand_total.currency().to_string(),
            },
            pricing_type: "fixed_price",
            metadata: ChargeMetadata {
                id: order.customer.id.clone(),
                customer_name: order.customer.name.clone(),
                customer_email: order.customer.email.clone(),
                store_increment_id: order.increment_id.to_string(),
            },
            redirect_url: redirect_url.to_string(),
        }
    }
}

/// Outbound client for the processor's charge API.
pub struct ChargeClient {
    client: Client,
    base_url: String,
}

impl ChargeClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::with_capacity(3);
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| PaymentError::Validation(format!("invalid api key: {e}")))?;
        headers.insert("X-CC-Api-Key", key);
        headers.insert("X-CC-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Validation(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a charge for the order.
    #[tracing::instrument(skip_all, fields(increment_id = %request.metadata.store_increment_id))]
    pub async fn create_charge(&self, request: &ChargeRequest) -> Result<Charge, PaymentError> {
        let url = format!("{}/charges/", self.base_url);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        Charge::from_body(&read_body(response).await?)
    }

    /// Look up a charge created earlier, for a customer returning to checkout.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_charge(&self, code: &ChargeCode) -> Result<Charge, PaymentError> {
        let url = format!("{}/charges/{}", self.base_url, code);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        Charge::from_body(&read_body(response).await?)
    }
}

/// The parts of a processor charge checkout needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub code: ChargeCode,
    pub hosted_url: String,
}

impl Charge {
    pub fn from_body(body: &serde_json::Value) -> Result<Self, PaymentError> {
        let code = body
            .pointer("/data/code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::ChargeCreationFailed("response has no data.code".into()))
            .and_then(|code| {
                ChargeCode::new(code)
                    .map_err(|e| PaymentError::ChargeCreationFailed(e.to_string()))
            })?;
        Ok(Self {
            code,
            hosted_url: hosted_url(body)?,
        })
    }
}

async fn read_body(response: reqwest::Response) -> Result<serde_json::Value, PaymentError> {
    let status = response.status();
    let body: serde_json::Value = response.json().await.map_err(transport_error)?;
    if !status.is_success() {
        let message = body
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .unwrap_or("no error message");
        return Err(PaymentError::ChargeCreationFailed(format!(
            "processor answered {status}: {message}"
        )));
    }
    Ok(body)
}

/// `data.hosted_url` of a charge response; its absence is a failure, never
/// an empty redirect.
pub fn hosted_url(body: &serde_json::Value) -> Result<String, PaymentError> {
    body.pointer("/data/hosted_url")
        .and_then(|v| v.as_str())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            PaymentError::ChargeCreationFailed("response has no data.hosted_url".into())
        })
}

fn transport_error(e: reqwest::Error) -> PaymentError {
    if e.is_timeout() {
        PaymentError::Timeout(format!("charge creation: {e}"))
    } else {
        PaymentError::ChargeCreationFailed(e.to_string())
    }
}
