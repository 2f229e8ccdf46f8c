//! Operation handlers, grouped by resource.
//!
//! Each submodule adds methods to [`AccessService`](crate::AccessService).

pub mod acl;
pub mod bucket;
pub mod bucket_config;
pub mod cors;
pub mod tagging;

pub use acl::AclSource;
pub use bucket::{DeleteError, DeleteObjectsOutput};
