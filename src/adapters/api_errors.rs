use crate::domain::error::PaymentError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

// Newtype so the domain error can implement the Axum response trait.
pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            // Answer as if nothing happened: no hint about why the delivery
            // was dropped, and no retry, since a redelivery cannot fix it.
            PaymentError::Authentication => {
                tracing::warn!("webhook signature rejected");
                return StatusCode::OK.into_response();
            }
            PaymentError::MalformedEvent(msg) => {
                tracing::error!(error = %msg, "malformed webhook event dropped");
                return StatusCode::OK.into_response();
            }
            PaymentError::OrderNotFound(id) => (
                StatusCode::NOT_FOUND,
                "order_not_found",
                format!("order {id} not found"),
            ),
            PaymentError::ChargeCreationFailed(msg) => {
                tracing::error!(error = %msg, "charge creation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "charge_creation_failed",
                    "payment processor did not return a checkout url".to_string(),
                )
            }
            PaymentError::CheckoutUnavailable(msg) => (
                StatusCode::CONFLICT,
                "checkout_unavailable",
                msg.clone(),
            ),
            PaymentError::Conflict(msg) => {
                tracing::warn!(error = %msg, "reconciliation conflict");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "conflict",
                    "try again later".to_string(),
                )
            }
            PaymentError::Timeout(msg) => {
                tracing::error!(error = %msg, "outbound call timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "timeout",
                    "upstream timed out".to_string(),
                )
            }
            PaymentError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            PaymentError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            PaymentError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
