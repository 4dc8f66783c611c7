//! # Inkwell Core
//!
//! The domain layer of the Inkwell content service.
//! Posts, per-owner profiles, the ports their storage must implement and the
//! services that keep the two consistent. No infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod search;
pub mod services;

pub use error::{DomainError, RepoError};
pub use services::{PostStore, ProfileStore, ReconcileReport, Reconciler, StoreSettings};
