//! tribi-cloud — travel eSIM order fulfillment service
//!
//! Long-running service that:
//! - Creates orders idempotently with immutable plan snapshots
//! - Collects payment through pluggable providers (mock, Stripe)
//! - Reconciles provider webhooks into the payment/order ledger
//! - Activates eSIMs from a pre-provisioned inventory pool, falling back
//!   to an external provisioning partner

mod api;
mod auth;
mod config;
mod db;
mod error;
mod payment;
mod provisioning;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tribi_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting tribi-cloud (env: {})", config.environment);

    // Initialize application state (pool + migrations + HTTP client)
    let state = AppState::new(&config).await?;

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("tribi-cloud HTTP listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
