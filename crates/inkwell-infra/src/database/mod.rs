//! Database connection management and PostgreSQL document stores.

mod connections;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

#[cfg(feature = "postgres")]
pub use connections::connect;
pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresProfileRepository};
