use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Extension};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use userdesk_api::api::format::FileUrlBuilder;
use userdesk_api::auth::password::{BcryptHasher, PasswordHasher};
use userdesk_api::config::{config, Environment, DEV_JWT_SECRET};
use userdesk_api::database::{admins, DatabaseManager};
use userdesk_api::handlers;
use userdesk_api::middleware::jwt_auth_middleware;
use userdesk_api::services::UserService;
use userdesk_api::state::AppState;
use userdesk_api::storage::{BlobStore, IntakeLimits};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_PATH, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config();
    info!("Starting UserDesk API in {:?} mode", config.environment);

    if matches!(config.environment, Environment::Production)
        && config.security.jwt_secret == DEV_JWT_SECRET
    {
        warn!("JWT_SECRET is still the development default; set a real secret");
    }

    let pool = DatabaseManager::connect().await?;
    DatabaseManager::init_schema(&pool).await?;

    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.security.bcrypt_cost));
    bootstrap_admin(&pool, hasher.as_ref()).await?;

    let blobs = BlobStore::open(&config.storage.root).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let public_base = config
        .server
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", bind_addr.replace("0.0.0.0", "localhost")));

    let limits = IntakeLimits {
        max_file_size_bytes: config.storage.max_file_size_bytes,
        max_files_per_slot: config.storage.max_files_per_slot,
    };

    let state = AppState {
        pool: pool.clone(),
        users: Arc::new(UserService::new(pool, blobs, hasher.clone(), limits)),
        files: FileUrlBuilder::parse(&public_base)?,
        hasher,
    };

    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("UserDesk API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/auth/login", post(handlers::auth::login))
        // Protected API
        .merge(protected_routes())
        // Stored blobs served verbatim; the URLs built on read point here
        .nest_service("/uploads", ServeDir::new(&config().storage.root))
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config().api.max_request_size_bytes));

    if config().security.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    if config().api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.layer(Extension(state))
}

fn protected_routes() -> Router {
    use handlers::{admins, auth, users};

    Router::new()
        // Admin session
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/change-password", post(auth::change_password))
        // Operator accounts
        .route("/api/admins", get(admins::list).post(admins::create))
        .route(
            "/api/admins/:id",
            axum::routing::put(admins::update).delete(admins::delete),
        )
        // User records
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/stats", get(users::stats))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/users/:id/download/:slot_token", get(users::download))
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "UserDesk API",
            "version": version,
            "description": "Admin dashboard backend - user records with per-user document storage",
            "endpoints": {
                "home": "/ (public)",
                "health": "/api/health (public)",
                "login": "/api/auth/login (public - token acquisition)",
                "auth": "/api/auth/* (protected - admin session)",
                "admins": "/api/admins[/:id] (protected - operator accounts)",
                "users": "/api/users[/:id] (protected - record management)",
                "stats": "/api/users/stats (protected)",
                "download": "/api/users/:id/download/:slotToken (protected)",
                "uploads": "/uploads/* (public - stored files)",
            }
        }
    }))
}

async fn health(Extension(state): Extension<AppState>) -> (StatusCode, Json<Value>) {
    let check = DatabaseManager::health_check(&state.pool).await;
    if let Err(e) = &check {
        warn!("health check failed: {}", e);
    }
    health_body(check.is_ok())
}

// The degraded body stays generic; sqlx error strings can carry the
// database file path and this endpoint is unauthenticated.
fn health_body(database_ok: bool) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    if database_ok {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "message": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database": "degraded"
                }
            })),
        )
    }
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Endpoint not found" })),
    )
}

/// Seeds the first admin from ADMIN_EMAIL/ADMIN_PASSWORD when the admins
/// table is empty, so a fresh deployment can log in at all.
async fn bootstrap_admin(
    pool: &sqlx::SqlitePool,
    hasher: &dyn PasswordHasher,
) -> anyhow::Result<()> {
    let security = &config().security;
    let (Some(email), Some(password)) = (
        security.bootstrap_admin_email.as_deref(),
        security.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    if admins::count(pool).await? > 0 {
        return Ok(());
    }

    let hashed = hasher.hash(password).map_err(anyhow::Error::new)?;
    let id = admins::insert(pool, "Administrator", email, &hashed, "admin").await?;
    info!(admin_id = id, email, "seeded bootstrap admin");
    Ok(())
}
