use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::format::AdminView;
use crate::auth::{generate_jwt, Claims};
use crate::database::admins;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - exchange admin credentials for a bearer token.
/// Unknown email and wrong password produce the same response.
pub async fn login(
    Extension(state): Extension<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Value> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation_error("Email and password are required"));
    }

    let admin = admins::find_active_by_email(&state.pool, &body.email).await?;
    let Some(admin) = admin else {
        warn!(email = %body.email, "login attempt for unknown admin");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    if !state.hasher.verify(&body.password, &admin.password)? {
        warn!(admin_id = admin.id, "login attempt with wrong password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    admins::touch_last_login(&state.pool, admin.id).await?;

    let claims = Claims::new(admin.id, admin.email.clone(), admin.name.clone(), admin.role.clone());
    let token = generate_jwt(claims)?;

    info!(admin_id = admin.id, "admin logged in");
    Ok(ApiResponse::success(json!({
        "token": token,
        "admin": AdminView::from(&admin),
    })))
}
