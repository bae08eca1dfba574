//! Diacamma API Server
//!
//! Main entry point for the Diacamma accounting service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diacamma_api::paypal::PaypalVerifier;
use diacamma_api::{AppState, create_router};
use diacamma_db::connect_with;
use diacamma_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diacamma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    let verifier = PaypalVerifier::new(config.payoff.paypal_url.clone());
    info!(url = %config.payoff.paypal_url, "PayPal verification configured");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
        payment_verifier: Arc::new(verifier),
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
