//! Schema for the Postgres document stores.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_posts;
mod m20240101_000002_create_profiles;
mod m20240101_000003_create_profile_post_refs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_posts::Migration),
            Box::new(m20240101_000002_create_profiles::Migration),
            Box::new(m20240101_000003_create_profile_post_refs::Migration),
        ]
    }
}
