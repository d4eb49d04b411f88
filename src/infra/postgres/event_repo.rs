use crate::domain::{error::PaymentError, event::NormalizedEvent};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// Record a webhook delivery in the event log.
/// Returns `true` if inserted, `false` if this event id was already seen.
pub async fn record_delivery(
    tx: &mut Tx<'_>,
    event: &NormalizedEvent,
    payload: &serde_json::Value,
) -> Result<bool, PaymentError> {
    let inserted: Option<bool> = sqlx::query_scalar(
        r#"
        INSERT INTO webhook_events (event_id, store_order_id, event_type, timeline_status, payload)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (event_id) DO NOTHING
        RETURNING true
        "#,
    )
    .bind(event.event_id.as_str())
    .bind(event.increment_id.as_str())
    .bind(event.event_type.as_str())
    .bind(event.timeline_status.as_str())
    .bind(payload)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(inserted.is_some())
}
