//! Caller identification and pre-signed URL validation for bucketgate.
//!
//! Signature computation happens upstream of this crate. What remains here is
//! everything the access-control engine needs to know about *who* is calling
//! and *until when* a pre-signed URL is valid:
//!
//! - [`credentials`] maps access key IDs to canonical users
//! - [`sigv4`] and [`sigv2`] pull the access key ID out of `Authorization` headers
//! - [`presigned`] parses pre-signed query parameters and checks expiry
//! - [`principal`] resolves a caller into a [`Principal`] relative to a resource owner
//!
//! # Usage
//!
//! ```rust
//! use bucketgate_auth::credentials::StaticCredentialProvider;
//! use bucketgate_auth::principal::{Principal, PrincipalResolver};
//! use bucketgate_core::Owner;
//!
//! let owner = Owner::default();
//! let provider = StaticCredentialProvider::new(vec![("AKID".to_owned(), owner.clone())]);
//! let resolver = PrincipalResolver::new(std::sync::Arc::new(provider));
//!
//! let (parts, ()) = http::Request::builder()
//!     .uri("/bucket/key")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//! let identity = resolver.identify(&parts).unwrap();
//! assert!(identity.caller.is_none());
//! assert_eq!(Principal::resolve(None, &owner.id), Principal::Anonymous);
//! ```

pub mod credentials;
pub mod error;
pub mod presigned;
pub mod principal;
pub mod sigv2;
pub mod sigv4;

pub use credentials::{CredentialProvider, StaticCredentialProvider};
pub use error::AuthError;
pub use presigned::{PresignedUrlGrant, validate_expiry};
pub use principal::{Principal, PrincipalResolver, RequestIdentity};
