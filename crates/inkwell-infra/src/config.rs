//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use inkwell_core::StoreSettings;

use crate::database::DatabaseConfig;

/// Where uploaded images go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Base of the URLs handed back for stored objects.
    pub public_base_url: String,
    /// Endpoint objects are PUT to. `None` keeps them in memory.
    pub upload_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: "memory://inkwell".to_string(),
            upload_url: None,
        }
    }
}

/// Infrastructure configuration.
#[derive(Debug, Clone)]
pub struct InfraConfig {
    /// `None` selects the in-memory document stores.
    pub database: Option<DatabaseConfig>,
    pub storage: StorageConfig,
    pub store: StoreSettings,
}

impl InfraConfig {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 100),
                min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 10),
            });

        let defaults = StoreSettings::default();
        let store = StoreSettings {
            max_write_retries: parse_or(&lookup, "MAX_WRITE_RETRIES", defaults.max_write_retries),
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", defaults.max_image_bytes),
        };

        let storage = StorageConfig {
            public_base_url: lookup("STORAGE_PUBLIC_BASE_URL")
                .unwrap_or_else(|| StorageConfig::default().public_base_url),
            upload_url: lookup("STORAGE_UPLOAD_URL").filter(|url| !url.trim().is_empty()),
        };

        Self {
            database,
            storage,
            store,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> InfraConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InfraConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config(&[]);

        assert!(config.database.is_none());
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.store.max_write_retries, 5);
        assert_eq!(config.store.max_image_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_database_and_tunables() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/inkwell"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("MAX_WRITE_RETRIES", "2"),
            ("MAX_IMAGE_BYTES", "not-a-number"),
            ("STORAGE_UPLOAD_URL", "https://bucket.test"),
        ]);

        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/inkwell");
        assert_eq!(database.max_connections, 20);
        assert_eq!(database.min_connections, 10);
        assert_eq!(config.store.max_write_retries, 2);
        assert_eq!(config.store.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.storage.upload_url.as_deref(),
            Some("https://bucket.test")
        );
    }
}
