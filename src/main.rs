use {
    commerce_sync::{
        AppState,
        adapters::coinbase::charges::ChargeClient,
        config::AppConfig,
        domain::notifier::LogNotifier,
    },
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    tokio::signal,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().expect("invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let charges = ChargeClient::new(&config.api_key, &config.api_url, config.outbound_timeout)
        .expect("failed to build charge client");

    let state = AppState {
        pool,
        webhook_secret: config.api_secret.as_str().into(),
        charges: Arc::new(charges),
        notifier: Arc::new(LogNotifier),
        store_name: config.store_name.as_str().into(),
        redirect_url: config.redirect_url.as_str().into(),
        outbound_timeout: config.outbound_timeout,
    };

    let app = commerce_sync::app(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind listener");
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
