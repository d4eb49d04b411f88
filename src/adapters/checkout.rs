use {
    crate::{
        AppState, adapters::api_errors::ApiError, domain::id::IncrementId, services::checkout,
    },
    axum::{
        Json,
        extract::{Path, State},
    },
};

/// Start the crypto checkout for a placed order and hand back the hosted
/// payment page the customer should be redirected to.
#[tracing::instrument(name = "checkout", skip(state))]
pub async fn start_checkout(
    State(state): State<AppState>,
    Path(increment_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let increment_id = IncrementId::new(increment_id)?;
    let redirect_url = checkout::start_checkout(
        &state.pool,
        &state.charges,
        &state.store_name,
        &state.redirect_url,
        &increment_id,
    )
    .await?;

    Ok(Json(serde_json::json!({"redirect_url": redirect_url})))
}
