use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user record exactly as stored. File slots hold storage-relative paths;
/// the multi-file slots (`doc3`, `doc4`) hold JSON arrays serialized into
/// text columns, decoded at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
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
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed set of user roles. Unknown strings are rejected at the API
/// boundary rather than stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(Role::Admin),
            "Manager" => Some(Role::Manager),
            "User" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::User => "User",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
