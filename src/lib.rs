pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    adapters::coinbase::charges::ChargeClient,
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::StatusCode,
        routing::{get, post},
    },
    domain::notifier::OrderNotifier,
    std::{sync::Arc, time::Duration},
    tower::ServiceBuilder,
    tower_http::timeout::TimeoutLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub webhook_secret: Arc<str>,
    pub charges: Arc<ChargeClient>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub store_name: Arc<str>,
    pub redirect_url: Arc<str>,
    pub outbound_timeout: Duration,
}

/// HTTP surface. When `request_timeout` elapses the handler future is
/// dropped, which rolls back any open transaction, and the caller gets 504.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/webhook", post(adapters::coinbase::webhook::wh_handler))
        .route(
            "/checkout/{increment_id}/start",
            post(adapters::checkout::start_checkout),
        )
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(64 * 1024)) // 64 KB, charge events are a few KB
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::GATEWAY_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}
