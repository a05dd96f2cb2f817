use axum::extract::{Extension, Multipart, Path};

use crate::api::format::{user_view, UserView};
use crate::database::users;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::multipart::parse_user_request;

/// GET /api/users - every active record, newest first, with expanded file
/// URLs and an item count.
pub async fn list(Extension(state): Extension<AppState>) -> ApiResult<Vec<UserView>> {
    let rows = users::list_active(&state.pool).await?;
    let views: Vec<UserView> = rows.iter().map(|row| user_view(row, &state.files)).collect();
    let count = views.len();
    Ok(ApiResponse::with_count(views, count))
}

/// GET /api/users/:id
pub async fn get(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<UserView> {
    let row = users::find_active(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user_view(&row, &state.files)))
}

/// POST /api/users - multipart form with profile fields plus optional file
/// parts for the five slots.
pub async fn create(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UserView> {
    let (input, uploads) = parse_user_request(&mut multipart).await?;
    let row = state.users.create(input, uploads).await?;
    Ok(ApiResponse::created(user_view(&row, &state.files)))
}

/// PUT /api/users/:id - same form shape as create; omitted file fields leave
/// their slots untouched, an omitted password keeps the stored hash.
pub async fn update(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<UserView> {
    let (input, uploads) = parse_user_request(&mut multipart).await?;
    let row = state.users.update(id, input, uploads).await?;
    Ok(ApiResponse::success(user_view(&row, &state.files)))
}

/// DELETE /api/users/:id - soft delete; the record's files stay on disk.
pub async fn delete(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.users.soft_delete(id).await?;
    Ok(ApiResponse::<()>::message("User deleted successfully"))
}
