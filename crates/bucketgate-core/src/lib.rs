//! Core identity types, configuration, and errors for bucketgate.
//!
//! This crate provides the building blocks shared by the authentication and
//! access-control crates: canonical user identifiers, resource owners, the
//! engine-wide configuration, and the core error type.

mod config;
mod error;
mod types;

pub use config::BucketgateConfig;
pub use error::BucketgateError;
pub use types::{CanonicalUserId, Owner};
