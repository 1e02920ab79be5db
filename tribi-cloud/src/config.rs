//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Default currency for orders when the client sends none
    pub default_currency: String,
    /// Default payment provider: MOCK | STRIPE
    pub payment_provider: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Stripe publishable key (returned to clients alongside client_secret)
    pub stripe_publishable_key: String,
    /// eSIM provisioning provider: LOCAL | CONNECTED_YOU
    pub esim_provider: String,
    /// ConnectedYou partner API base URL
    pub connected_you_base_url: String,
    /// ConnectedYou API key
    pub connected_you_api_key: String,
    /// ConnectedYou partner ID
    pub connected_you_partner_id: String,
    /// ConnectedYou request timeout in seconds
    pub connected_you_timeout_seconds: u64,
    /// ConnectedYou dry-run mode (build + log requests, return synthetic results)
    pub connected_you_dry_run: bool,
    /// Invoice number prefix
    pub invoice_prefix: String,
    /// JWT secret for user authentication
    pub jwt_secret: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "USD".into()),
            payment_provider: std::env::var("PAYMENT_PROVIDER").unwrap_or_else(|_| "MOCK".into()),
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            stripe_publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            esim_provider: std::env::var("ESIM_PROVIDER").unwrap_or_else(|_| "LOCAL".into()),
            connected_you_base_url: std::env::var("CONNECTED_YOU_BASE_URL").unwrap_or_default(),
            connected_you_api_key: std::env::var("CONNECTED_YOU_API_KEY").unwrap_or_default(),
            connected_you_partner_id: std::env::var("CONNECTED_YOU_PARTNER_ID")
                .unwrap_or_else(|_| "tribi-dev".into()),
            connected_you_timeout_seconds: std::env::var("CONNECTED_YOU_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            connected_you_dry_run: std::env::var("CONNECTED_YOU_DRY_RUN")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            invoice_prefix: std::env::var("INVOICE_PREFIX").unwrap_or_else(|_| "TRB".into()),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            environment,
        })
    }
}
