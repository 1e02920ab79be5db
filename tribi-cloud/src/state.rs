//! Application state for tribi-cloud

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for outbound provider calls (Stripe, ConnectedYou)
    pub http: reqwest::Client,
}

impl AppState {
    /// Create a new AppState: connect the pool, run migrations, build the HTTP client
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connected_you_timeout_seconds))
            .build()?;

        Ok(Self {
            pool,
            config: Arc::new(config.clone()),
            http,
        })
    }
}
