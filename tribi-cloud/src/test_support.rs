//! Shared fixtures for database-backed tests

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::UserIdentity;
use crate::config::Config;
use crate::state::AppState;

pub const USER_ID: i64 = 1;
pub const COUNTRY_ID: i64 = 1;
pub const CARRIER_ID: i64 = 1;
pub const PLAN_ID: i64 = 1;

pub fn config() -> Config {
    Config {
        database_url: String::new(),
        http_port: 0,
        environment: "development".into(),
        default_currency: "USD".into(),
        payment_provider: "MOCK".into(),
        stripe_secret_key: "sk_test_fixture".into(),
        stripe_webhook_secret: "whsec_fixture".into(),
        stripe_publishable_key: "pk_test_fixture".into(),
        esim_provider: "LOCAL".into(),
        connected_you_base_url: String::new(),
        connected_you_api_key: String::new(),
        connected_you_partner_id: "tribi-dev".into(),
        connected_you_timeout_seconds: 2,
        connected_you_dry_run: true,
        invoice_prefix: "TRB".into(),
        jwt_secret: "test-secret".into(),
    }
}

pub fn state(pool: PgPool) -> AppState {
    state_with(pool, config())
}

pub fn state_with(pool: PgPool, config: Config) -> AppState {
    AppState {
        pool,
        config: Arc::new(config),
        http: reqwest::Client::new(),
    }
}

pub fn user() -> UserIdentity {
    UserIdentity {
        user_id: USER_ID,
        email: "traveler@example.com".into(),
    }
}

/// Seed one user and an active plan with its country and carrier.
/// Returns the plan ID. The plan is priced at 12.50 USD (1250 minor units).
pub async fn seed_catalog(pool: &PgPool) -> i64 {
    sqlx::query("INSERT INTO users (id, email, created_at) VALUES ($1, 'traveler@example.com', 0)")
        .bind(USER_ID)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO countries (id, name, iso_code) VALUES ($1, 'Japan', 'JP')")
        .bind(COUNTRY_ID)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO carriers (id, name, country_id) VALUES ($1, 'NTT Docomo', $2)")
        .bind(CARRIER_ID)
        .bind(COUNTRY_ID)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        r#"
        INSERT INTO plans (id, name, country_id, carrier_id, data_amount_mb, duration_days,
                           price, currency, is_active)
        VALUES ($1, 'Japan 5GB / 10 days', $2, $3, 5120, 10, 12.50, 'USD', TRUE)
        "#,
    )
    .bind(PLAN_ID)
    .bind(COUNTRY_ID)
    .bind(CARRIER_ID)
    .execute(pool)
    .await
    .unwrap();

    PLAN_ID
}

pub async fn count(pool: &PgPool, sql: &str, bind: i64) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).bind(bind).fetch_one(pool).await.unwrap();
    n
}
