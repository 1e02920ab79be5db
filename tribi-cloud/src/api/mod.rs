//! API routes for tribi-cloud

pub mod esims;
pub mod health;
pub mod orders;
pub mod payments;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Provider webhooks (signature-verified, raw body, no user auth)
    let webhook = Router::new().route("/api/payments/webhook", post(payments::handle_webhook));

    // Storefront endpoints (user JWT)
    let storefront = Router::new()
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/mine", get(orders::list_my_orders))
        .route("/api/payments/create", post(payments::create_payment))
        .route("/api/esims/activate", post(esims::activate))
        .route("/api/esims/mine", get(esims::list_my_esims))
        .route("/api/esims/{id}", get(esims::get_esim))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(webhook)
        .merge(storefront)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
