//! S3 bucket and object access control for bucketgate.
//!
//! This crate decides whether a caller may perform an S3 operation on a
//! bucket or object. It combines ACLs, canned ACLs, the public access block,
//! bucket policies and pre-signed URL expiry into one decision, and answers
//! CORS preflight requests from a bucket's CORS configuration.
//!
//! # Architecture
//!
//! ```text
//! http::request::Parts
//!        |
//!        v
//! PrincipalResolver (bucketgate-auth) -> RequestContext
//!        |
//!        v
//! AccessService::authorize
//!        |
//!        v
//! pipeline::authorize(BucketSnapshot, ObjectEntry)
//!   presigned expiry -> policy Deny -> RestrictPublicBuckets
//!   -> policy Allow -> ACL (IgnorePublicAcls)
//! ```
//!
//! Bucket configuration is held in copy-on-write snapshots, so evaluation
//! never waits on a concurrent configuration write.

pub mod acl;
pub mod action;
pub mod canned;
pub mod config;
pub mod context;
pub mod cors;
pub mod error;
pub mod ops;
pub mod pipeline;
pub mod policy;
pub mod public_access_block;
pub mod service;
pub mod state;

pub use acl::{AccessControlList, Decision, Grant, Grantee, Group, Permission};
pub use action::S3Action;
pub use canned::CannedAcl;
pub use config::AccessConfig;
pub use context::RequestContext;
pub use cors::{CorsConfiguration, CorsHeaders, CorsMatcher, CorsRule};
pub use error::{AccessError, AccessResult};
pub use ops::{AclSource, DeleteError, DeleteObjectsOutput};
pub use pipeline::{AccessBasis, Authorization};
pub use policy::{BucketPolicy, ConditionContext, PolicyDecision};
pub use public_access_block::PublicAccessBlockConfiguration;
pub use service::{AccessService, AuthorizedRequest};
pub use state::ObjectOwnership;
