use axum::extract::Extension;
use chrono::{Duration, Utc};

use crate::api::format::StatsView;
use crate::database::users;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/users/stats - dashboard headline numbers over active records.
pub async fn stats(Extension(state): Extension<AppState>) -> ApiResult<StatsView> {
    let week_ago = Utc::now() - Duration::days(7);

    let total_users = users::count_active(&state.pool).await?;
    let role_distribution = users::role_distribution(&state.pool).await?;
    let users_with_documents = users::count_with_documents(&state.pool).await?;
    let recent_users = users::count_created_since(&state.pool, week_ago).await?;

    Ok(ApiResponse::success(StatsView {
        total_users,
        role_distribution,
        users_with_documents,
        recent_users,
    }))
}
