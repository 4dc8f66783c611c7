//! # Inkwell Infrastructure
//!
//! Concrete implementations of the ports defined in `inkwell-core`.
//! This crate contains the document stores, object storage, configuration
//! and telemetry setup.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL document stores via SeaORM
//! - `http-storage` - Image uploads via HTTP PUT (reqwest)

pub mod config;
pub mod database;
pub mod memory;
pub mod state;
pub mod storage;
pub mod telemetry;

// Re-exports - In-Memory
pub use memory::{InMemoryPostRepository, InMemoryProfileRepository};
pub use storage::InMemoryObjectStorage;

pub use config::{InfraConfig, StorageConfig};
pub use database::DatabaseConfig;
pub use state::ContentServices;
pub use telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresProfileRepository};

#[cfg(feature = "http-storage")]
pub use storage::HttpObjectStorage;
