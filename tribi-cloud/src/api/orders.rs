//! Order endpoints
//!
//! POST /api/orders      — create an order (Idempotency-Key header honored)
//! GET  /api/orders/mine — list the caller's orders

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::error::ApiResponse;

use crate::auth::UserIdentity;
use crate::db::esims::EsimProfileRow;
use crate::db::orders::OrderRow;
use crate::error::ServiceResult;
use crate::services::{orders, pricing};
use crate::state::AppState;

use super::esims::{EsimProfileResponse, parse_id};

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub currency: String,
    pub amount_minor_units: i64,
    /// Major-unit display amount, e.g. "12.50"
    pub amount_major: String,
    pub plan_snapshot: Value,
    pub esim_profile: Option<EsimProfileResponse>,
    pub created_at: i64,
}

impl OrderResponse {
    fn from_parts(order: OrderRow, profile: Option<EsimProfileRow>) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status,
            currency: order.currency,
            amount_minor_units: order.amount_minor_units,
            amount_major: pricing::amount_major(order.amount_minor_units).to_string(),
            plan_snapshot: order.plan_snapshot,
            esim_profile: profile.map(Into::into),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub plan_id: String,
    pub currency: Option<String>,
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderRequest>,
) -> ServiceResult<Json<ApiResponse<OrderResponse>>> {
    let plan_id = parse_id(&body.plan_id)?;
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let (order, profile) =
        orders::create_order(&state, &user, plan_id, body.currency, idempotency_key).await?;

    Ok(Json(ApiResponse::success(OrderResponse::from_parts(
        order,
        Some(profile),
    ))))
}

/// GET /api/orders/mine
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ServiceResult<Json<ApiResponse<Vec<OrderResponse>>>> {
    let rows = orders::list_orders(&state, &user).await?;
    let items = rows
        .into_iter()
        .map(|(order, profile)| OrderResponse::from_parts(order, profile))
        .collect();

    Ok(Json(ApiResponse::success(items)))
}
