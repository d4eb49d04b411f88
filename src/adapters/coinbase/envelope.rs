//! Wire shape of a processor webhook delivery and its reduction to a
//! [`NormalizedEvent`].

use {
    crate::domain::{
        error::PaymentError,
        event::{ChargePayment, EventType, NormalizedEvent, TimelineStatus},
        id::{ChargeCode, EventId, IncrementId},
        money::{Amount, CurrencyCode, Money},
    },
    chrono::{DateTime, Utc},
    serde::Deserialize,
};

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub id: String,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    pub event: ChargeEvent,
}

#[derive(Debug, Deserialize)]
pub struct ChargeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub api_version: Option<String>,
    pub data: ChargeData,
}

#[derive(Debug, Deserialize)]
pub struct ChargeData {
    pub code: String,
    #[serde(default)]
    pub metadata: ChargeMetadata,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub payments: Vec<PaymentEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChargeMetadata {
    #[serde(default)]
    pub store_increment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    pub status: TimelineStatus,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntry {
    pub transaction_id: String,
    #[serde(default)]
    pub status: String,
    pub value: PaymentValue,
}

#[derive(Debug, Deserialize)]
pub struct PaymentValue {
    pub crypto: Price,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub amount: String,
    pub currency: String,
}

impl WebhookEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(body).map_err(|e| PaymentError::MalformedEvent(e.to_string()))
    }
}

fn malformed(e: PaymentError) -> PaymentError {
    match e {
        PaymentError::Validation(msg) => PaymentError::MalformedEvent(msg),
        other => other,
    }
}

/// Most recent timeline entry by time. Entries sharing a timestamp resolve
/// to the one delivered later in the array.
pub fn latest_timeline_entry(timeline: &[TimelineEntry]) -> Result<&TimelineEntry, PaymentError> {
    timeline
        .iter()
        .max_by_key(|entry| entry.time)
        .ok_or_else(|| PaymentError::MalformedEvent("charge timeline is empty".into()))
}

fn charge_payment(entry: &PaymentEntry) -> Result<ChargePayment, PaymentError> {
    if entry.transaction_id.trim().is_empty() {
        return Err(PaymentError::MalformedEvent(
            "payment has an empty transaction_id".into(),
        ));
    }
    let crypto = Money::new(
        Amount::new(&entry.value.crypto.amount).map_err(malformed)?,
        CurrencyCode::new(&entry.value.crypto.currency).map_err(malformed)?,
    );
    Ok(ChargePayment {
        transaction_id: entry.transaction_id.clone(),
        crypto,
        network_status: entry.status.clone(),
    })
}

pub fn normalize(envelope: &WebhookEnvelope) -> Result<NormalizedEvent, PaymentError> {
    let data = &envelope.event.data;

    let increment_id = data
        .metadata
        .store_increment_id
        .as_deref()
        .ok_or_else(|| {
            PaymentError::MalformedEvent("metadata.store_increment_id is missing".into())
        })
        .and_then(|id| IncrementId::new(id).map_err(malformed))?;
    let charge_code = ChargeCode::new(&data.code).map_err(malformed)?;
    let event_id = EventId::new(&envelope.event.id).map_err(malformed)?;

    let latest = latest_timeline_entry(&data.timeline)?;
    let payment = data.payments.first().map(charge_payment).transpose()?;

    Ok(NormalizedEvent {
        event_id,
        increment_id,
        charge_code,
        event_type: envelope.event.event_type,
        timeline_status: latest.status,
        timeline_context: latest.context.clone(),
        status_at: latest.time,
        payment,
    })
}
