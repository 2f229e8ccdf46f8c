//! Bucket and object access state.
//!
//! The state hierarchy is:
//!
//! - [`AccessStore`] - name to bucket registry
//!   - [`BucketEntry`] - copy-on-write [`BucketSnapshot`] plus objects
//!     - [`ObjectEntry`] - owner, ACL and tags of one object

pub mod bucket;
pub mod object;
pub mod store;

pub use bucket::{BucketEntry, BucketSnapshot, ObjectOwnership};
pub use object::{MAX_OBJECT_TAGS, ObjectEntry};
pub use store::AccessStore;
