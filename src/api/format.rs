//! Wire-format views of stored rows.
//!
//! Rows keep storage-relative paths; clients get absolute download URLs and
//! decoded name lists. Password hashes never leave this boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::database::models::{AdminRow, UserRow};
use crate::database::users::RoleCount;
use crate::storage::slots::{self, Slot};

/// Expands storage-relative blob paths into absolute public URLs under
/// `/uploads`.
#[derive(Debug, Clone)]
pub struct FileUrlBuilder {
    base: Url,
}

impl FileUrlBuilder {
    /// `base` should be the service origin, e.g. `http://localhost:5000`.
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self { base: Url::parse(base)? })
    }

    pub fn url_for(&self, relative: &str) -> Option<String> {
        self.base
            .join(&format!("uploads/{}", relative))
            .ok()
            .map(String::from)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub profile_image: Option<String>,
    pub doc1_url: Option<String>,
    pub doc1_name: Option<String>,
    pub doc2_url: Option<String>,
    pub doc2_name: Option<String>,
    pub doc3_urls: Vec<String>,
    pub doc3_names: Vec<String>,
    pub doc4_urls: Vec<String>,
    pub doc4_names: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn user_view(row: &UserRow, files: &FileUrlBuilder) -> UserView {
    let (doc3_paths, doc3_names) = slots::decode_multi(
        row.doc3.as_deref(),
        row.doc3_original_names.as_deref(),
        row.id,
        Slot::Doc3,
    );
    let (doc4_paths, doc4_names) = slots::decode_multi(
        row.doc4.as_deref(),
        row.doc4_original_names.as_deref(),
        row.id,
        Slot::Doc4,
    );

    UserView {
        id: row.id,
        name: row.name.clone(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        address: row.address.clone(),
        role: row.role.clone(),
        profile_image: row.profile_image.as_deref().and_then(|p| files.url_for(p)),
        doc1_url: row.doc1.as_deref().and_then(|p| files.url_for(p)),
        doc1_name: row.doc1_original_name.clone(),
        doc2_url: row.doc2.as_deref().and_then(|p| files.url_for(p)),
        doc2_name: row.doc2_original_name.clone(),
        doc3_urls: doc3_paths.iter().filter_map(|p| files.url_for(p)).collect(),
        doc3_names,
        doc4_urls: doc4_paths.iter().filter_map(|p| files.url_for(p)).collect(),
        doc4_names,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Admin identity as returned by login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&AdminRow> for AdminView {
    fn from(row: &AdminRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            role: row.role.clone(),
        }
    }
}

/// Fuller admin shape for the session endpoint and admin management.
/// Everything but the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AdminRow> for AdminProfile {
    fn from(row: &AdminRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            role: row.role.clone(),
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_users: i64,
    pub role_distribution: Vec<RoleCount>,
    pub users_with_documents: i64,
    pub recent_users: i64,
}
