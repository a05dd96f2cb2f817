// Typed queries for the admins table.
use chrono::Utc;
use sqlx::SqlitePool;

use super::models::AdminRow;

const ADMIN_COLUMNS: &str =
    "id, name, email, password, role, is_active, last_login, created_at, updated_at";

pub async fn list(pool: &SqlitePool) -> Result<Vec<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Unlike [`find_active_by_id`] this also returns deactivated admins, so
/// management edits can re-activate them.
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(&format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_active_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?1 AND is_active = 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_active_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<AdminRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminRow>(&format!(
        "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1 AND is_active = 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await
}

pub async fn insert(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO admins (name, email, password, role, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn email_in_use_by_other(
    pool: &SqlitePool,
    email: &str,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE email = ?1 AND id != ?2")
        .bind(email)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE email = ?1")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Full-row update of the editable columns; callers merge unchanged values
/// from the existing row.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    email: &str,
    role: &str,
    is_active: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admins SET name = ?1, email = ?2, role = ?3, is_active = ?4, updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(is_active)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Hard delete. Returns the number of rows removed so callers can 404 on a
/// missing id.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admins WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch_last_login(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET last_login = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password(
    pool: &SqlitePool,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET password = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
