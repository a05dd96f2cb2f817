// Typed queries for the users table. Column values arrive here already
// encoded; slot columns are plain text as far as SQL is concerned.
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::models::UserRow;

const USER_COLUMNS: &str = "id, name, email, password, phone, address, role, profile_image, \
     doc1, doc1_original_name, doc2, doc2_original_name, \
     doc3, doc3_original_names, doc4, doc4_original_names, \
     is_active, created_at, updated_at";

/// Full set of writable columns for a user row. Used for both inserts and
/// updates, since an update rewrites every column.
#[derive(Debug, Clone, Default)]
pub struct UserWrite {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub profile_image: Option<String>,
    pub doc1: Option<String>,
    pub doc1_original_name: Option<String>,
    pub doc2: Option<String>,
    pub doc2_original_name: Option<String>,
    pub doc3: Option<String>,
    pub doc3_original_names: Option<String>,
    pub doc4: Option<String>,
    pub doc4_original_names: Option<String>,
}

pub async fn list_active(pool: &SqlitePool) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find_active(pool: &SqlitePool, id: i64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND is_active = 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Checks whether an email is already held by a live record, optionally
/// ignoring one record (the one being updated).
pub async fn email_in_use(
    pool: &SqlitePool,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = match exclude_id {
        Some(id) => {
            sqlx::query_as(
                "SELECT id FROM users WHERE email = ?1 AND is_active = 1 AND id != ?2 LIMIT 1",
            )
            .bind(email)
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT id FROM users WHERE email = ?1 AND is_active = 1 LIMIT 1")
                .bind(email)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(found.is_some())
}

pub async fn insert(pool: &SqlitePool, w: &UserWrite) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (name, email, password, phone, address, role, profile_image, \
         doc1, doc1_original_name, doc2, doc2_original_name, \
         doc3, doc3_original_names, doc4, doc4_original_names, \
         is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 1, ?16, ?16)",
    )
    .bind(&w.name)
    .bind(&w.email)
    .bind(&w.password)
    .bind(&w.phone)
    .bind(&w.address)
    .bind(&w.role)
    .bind(&w.profile_image)
    .bind(&w.doc1)
    .bind(&w.doc1_original_name)
    .bind(&w.doc2)
    .bind(&w.doc2_original_name)
    .bind(&w.doc3)
    .bind(&w.doc3_original_names)
    .bind(&w.doc4)
    .bind(&w.doc4_original_names)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update(pool: &SqlitePool, id: i64, w: &UserWrite) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET name = ?1, email = ?2, password = ?3, phone = ?4, address = ?5, \
         role = ?6, profile_image = ?7, \
         doc1 = ?8, doc1_original_name = ?9, doc2 = ?10, doc2_original_name = ?11, \
         doc3 = ?12, doc3_original_names = ?13, doc4 = ?14, doc4_original_names = ?15, \
         updated_at = ?16 \
         WHERE id = ?17",
    )
    .bind(&w.name)
    .bind(&w.email)
    .bind(&w.password)
    .bind(&w.phone)
    .bind(&w.address)
    .bind(&w.role)
    .bind(&w.profile_image)
    .bind(&w.doc1)
    .bind(&w.doc1_original_name)
    .bind(&w.doc2)
    .bind(&w.doc2_original_name)
    .bind(&w.doc3)
    .bind(&w.doc3_original_names)
    .bind(&w.doc4)
    .bind(&w.doc4_original_names)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Marks a record inactive. Returns false when no live record matched.
pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?1 WHERE id = ?2 AND is_active = 1")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

pub async fn count_active(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(pool)
        .await
}

pub async fn role_distribution(pool: &SqlitePool) -> Result<Vec<RoleCount>, sqlx::Error> {
    sqlx::query_as("SELECT role, COUNT(*) as count FROM users WHERE is_active = 1 GROUP BY role")
        .fetch_all(pool)
        .await
}

pub async fn count_with_documents(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE is_active = 1 AND \
         (doc1 IS NOT NULL OR doc2 IS NOT NULL OR doc3 IS NOT NULL OR doc4 IS NOT NULL)",
    )
    .fetch_one(pool)
    .await
}

pub async fn count_created_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1 AND created_at >= ?1")
        .bind(since)
        .fetch_one(pool)
        .await
}
