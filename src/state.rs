use std::sync::Arc;

use sqlx::SqlitePool;

use crate::api::format::FileUrlBuilder;
use crate::auth::password::PasswordHasher;
use crate::services::UserService;

/// Shared handles injected into every request as an extension.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: Arc<UserService>,
    pub files: FileUrlBuilder,
    pub hasher: Arc<dyn PasswordHasher>,
}
