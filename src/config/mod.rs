use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// External base URL used when expanding stored file paths into links.
    /// When unset, links are built from the bound host and port.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files; area subdirectories live under it.
    pub root: String,
    pub max_file_size_bytes: usize,
    pub max_files_per_slot: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Whole-request ceiling for multipart bodies. Kept well above the
    /// per-file cap so the per-file check is the one that fires.
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

/// Placeholder secret shipped for local development. Production deployments
/// must override it via JWT_SECRET; main() warns when they don't.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("USERDESK_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(v);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root = v;
        }
        if let Ok(v) = env::var("MAX_FILE_SIZE_BYTES") {
            self.storage.max_file_size_bytes = v.parse().unwrap_or(self.storage.max_file_size_bytes);
        }
        if let Ok(v) = env::var("MAX_FILES_PER_SLOT") {
            self.storage.max_files_per_slot = v.parse().unwrap_or(self.storage.max_files_per_slot);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.security.bootstrap_admin_email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.bootstrap_admin_password = Some(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                path: "data/userdesk.db".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            storage: StorageConfig {
                root: "uploads".to_string(),
                max_file_size_bytes: 10 * 1024 * 1024, // 10MB per file
                max_files_per_slot: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024 * 1024,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 10,
                bootstrap_admin_email: Some("admin@example.com".to_string()),
                bootstrap_admin_password: Some("admin123".to_string()),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                path: "data/userdesk.db".to_string(),
                max_connections: 20,
                connection_timeout: 10,
            },
            storage: StorageConfig {
                root: "uploads".to_string(),
                max_file_size_bytes: 10 * 1024 * 1024,
                max_files_per_slot: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024 * 1024,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 12,
                bootstrap_admin_email: None,
                bootstrap_admin_password: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                path: "data/userdesk.db".to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            storage: StorageConfig {
                root: "uploads".to_string(),
                max_file_size_bytes: 10 * 1024 * 1024,
                max_files_per_slot: 10,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024 * 1024,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 4,
                bcrypt_cost: 12,
                bootstrap_admin_email: None,
                bootstrap_admin_password: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert!(config.security.bootstrap_admin_email.is_some());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(config.security.bootstrap_admin_email.is_none());
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn test_request_ceiling_above_per_file_cap() {
        for config in [AppConfig::development(), AppConfig::staging(), AppConfig::production()] {
            assert!(config.api.max_request_size_bytes > config.storage.max_file_size_bytes);
        }
    }
}
