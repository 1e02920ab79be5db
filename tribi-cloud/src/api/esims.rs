//! eSIM endpoints
//!
//! POST /api/esims/activate — run the activation workflow for a paid order
//! GET  /api/esims/mine     — list the caller's eSIM profiles
//! GET  /api/esims/{id}     — one profile by ID

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::UserIdentity;
use crate::db;
use crate::db::esims::EsimProfileRow;
use crate::error::ServiceResult;
use crate::services::activation;
use crate::state::AppState;

/// Customer-facing projection of an eSIM profile
#[derive(Debug, Serialize)]
pub struct EsimProfileResponse {
    pub id: String,
    pub order_id: String,
    pub status: String,
    pub activation_code: Option<String>,
    pub iccid: Option<String>,
    pub qr_payload: Option<String>,
    pub instructions: Option<String>,
    pub inventory_item_id: Option<String>,
    pub provider_reference: Option<String>,
    pub provisioned_at: Option<i64>,
}

impl From<EsimProfileRow> for EsimProfileResponse {
    fn from(row: EsimProfileRow) -> Self {
        Self {
            id: row.id.to_string(),
            order_id: row.order_id.to_string(),
            status: row.status,
            activation_code: row.activation_code,
            iccid: row.iccid,
            qr_payload: row.qr_payload,
            instructions: row.instructions,
            inventory_item_id: row.inventory_item_id.map(|id| id.to_string()),
            provider_reference: row.provider_reference,
            provisioned_at: row.provisioned_at,
        }
    }
}

pub(super) fn parse_id(s: &str) -> Result<i64, AppError> {
    s.parse()
        .map_err(|_| AppError::with_message(ErrorCode::ValidationFailed, "Invalid ID"))
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub order_id: String,
}

/// POST /api/esims/activate
pub async fn activate(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(body): Json<ActivateRequest>,
) -> ServiceResult<Json<ApiResponse<EsimProfileResponse>>> {
    let order_id = parse_id(&body.order_id)?;
    let profile = activation::activate(&state, &user, order_id).await?;

    Ok(Json(ApiResponse::success(profile.into())))
}

/// GET /api/esims/mine
pub async fn list_my_esims(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ServiceResult<Json<ApiResponse<Vec<EsimProfileResponse>>>> {
    let profiles = db::esims::list_for_user(&state.pool, user.user_id).await?;
    let items = profiles.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(items)))
}

/// GET /api/esims/{id}
pub async fn get_esim(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ServiceResult<Json<ApiResponse<EsimProfileResponse>>> {
    let id = parse_id(&id)?;
    let profile = db::esims::find_for_user(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::EsimNotFound))?;

    Ok(Json(ApiResponse::success(profile.into())))
}
