use axum::extract::{Extension, Path};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::format::AdminProfile;
use crate::database::admins;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAdmin};
use crate::state::AppState;

/// GET /api/admins - every operator account, newest first, deactivated ones
/// included so they can be re-enabled from the dashboard.
pub async fn list(Extension(state): Extension<AppState>) -> ApiResult<Vec<AdminProfile>> {
    let rows = admins::list(&state.pool).await?;
    let views: Vec<AdminProfile> = rows.iter().map(AdminProfile::from).collect();
    let count = views.len();
    Ok(ApiResponse::with_count(views, count))
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// POST /api/admins
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<AuthAdmin>,
    Json(body): Json<CreateAdminRequest>,
) -> ApiResult<AdminProfile> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Name, email, and password are required",
        ));
    }
    if body.password.len() < 6 {
        return Err(ApiError::validation_error(
            "Password must be at least 6 characters",
        ));
    }

    let email = body.email.trim();
    if admins::email_exists(&state.pool, email).await? {
        return Err(ApiError::conflict("Admin with this email already exists"));
    }

    let hashed = state.hasher.hash(&body.password)?;
    let role = body.role.as_deref().unwrap_or("admin");
    let id = admins::insert(&state.pool, body.name.trim(), email, &hashed, role).await?;

    let row = admins::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Failed to load created admin"))?;

    info!(admin_id = id, created_by = actor.admin_id, "admin account created");
    Ok(ApiResponse::created(AdminProfile::from(&row)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// PUT /api/admins/:id - partial update of name, email, role, and active
/// flag. Deactivated accounts keep their row and can be re-activated here;
/// password changes go through /api/auth/change-password.
pub async fn update(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAdminRequest>,
) -> ApiResult<AdminProfile> {
    let row = admins::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))?;

    if body.name.is_none() && body.email.is_none() && body.role.is_none() && body.is_active.is_none()
    {
        return Err(ApiError::validation_error("No fields to update"));
    }

    if let Some(email) = body.email.as_deref() {
        if admins::email_in_use_by_other(&state.pool, email, id).await? {
            return Err(ApiError::conflict("Email is already in use"));
        }
    }

    let name = body.name.as_deref().unwrap_or(&row.name);
    let email = body.email.as_deref().unwrap_or(&row.email);
    let role = body.role.as_deref().unwrap_or(&row.role);
    let is_active = body.is_active.unwrap_or(row.is_active);

    admins::update(&state.pool, id, name, email, role, is_active).await?;

    let row = admins::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))?;

    info!(admin_id = id, "admin account updated");
    Ok(ApiResponse::success(AdminProfile::from(&row)))
}

/// DELETE /api/admins/:id - hard delete of an operator account. An admin
/// cannot delete the account behind their own token.
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<AuthAdmin>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if id == actor.admin_id {
        return Err(ApiError::validation_error("You cannot delete yourself"));
    }

    let removed = admins::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(ApiError::not_found("Admin not found"));
    }

    info!(admin_id = id, deleted_by = actor.admin_id, "admin account deleted");
    Ok(ApiResponse::<()>::message("Admin deleted successfully"))
}
