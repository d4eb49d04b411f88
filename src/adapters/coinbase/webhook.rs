use {
    super::{
        envelope::{WebhookEnvelope, normalize},
        signature::{self, SIGNATURE_HEADER},
    },
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::error::PaymentError,
        services::reconciler::{ReconcileOutcome, reconcile},
    },
    axum::{
        Json,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
    },
};

#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(
        event_id = tracing::field::Empty,
        event_type = tracing::field::Empty,
        increment_id = tracing::field::Empty,
    )
)]
pub async fn wh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let sig = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::Authentication)?;

    // Must run on the untouched bytes.
    if !signature::verify(&body, sig, &state.webhook_secret) {
        return Err(PaymentError::Authentication.into());
    }

    let envelope = WebhookEnvelope::parse(&body)?;
    let event = normalize(&envelope)?;
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(PaymentError::from)?;

    tracing::Span::current()
        .record("event_id", tracing::field::display(&event.event_id))
        .record("event_type", tracing::field::display(&event.event_type))
        .record("increment_id", tracing::field::display(&event.increment_id));
    tracing::debug!(
        attempt = envelope.attempt_number.unwrap_or(1),
        status = %event.timeline_status,
        "webhook authenticated"
    );

    let outcome = reconcile(
        &state.pool,
        &*state.notifier,
        state.outbound_timeout,
        &event,
        &payload,
    )
    .await?;

    match outcome {
        ReconcileOutcome::OrderMissing => Ok(StatusCode::OK.into_response()),
        outcome => {
            tracing::info!(outcome = outcome.as_str(), "webhook reconciled");
            Ok(Json(serde_json::json!({"status": outcome.as_str()})).into_response())
        }
    }
}
