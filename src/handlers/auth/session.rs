use axum::{extract::Extension, Json};
use serde::Deserialize;
use tracing::info;

use crate::api::format::AdminProfile;
use crate::database::admins;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAdmin};
use crate::state::AppState;

/// GET /api/auth/me - profile of the admin behind the presented token.
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(admin): Extension<AuthAdmin>,
) -> ApiResult<AdminProfile> {
    let row = admins::find_active_by_id(&state.pool, admin.admin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))?;

    Ok(ApiResponse::success(AdminProfile::from(&row)))
}

/// POST /api/auth/logout - stateless acknowledgement; the client drops the
/// token, nothing is revoked server-side.
pub async fn logout(Extension(admin): Extension<AuthAdmin>) -> ApiResult<()> {
    info!(admin_id = admin.admin_id, "admin logged out");
    Ok(ApiResponse::<()>::message("Logged out successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    if body.new_password.len() < 6 {
        return Err(ApiError::validation_error(
            "New password must be at least 6 characters",
        ));
    }

    let row = admins::find_active_by_id(&state.pool, admin.admin_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))?;

    if !state.hasher.verify(&body.current_password, &row.password)? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let hashed = state.hasher.hash(&body.new_password)?;
    admins::update_password(&state.pool, row.id, &hashed).await?;

    info!(admin_id = row.id, "admin changed password");
    Ok(ApiResponse::<()>::message("Password changed successfully"))
}
