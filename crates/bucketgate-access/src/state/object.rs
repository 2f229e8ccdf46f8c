//! Per-object access state.

use std::collections::BTreeMap;

use bucketgate_core::Owner;
use chrono::{DateTime, Utc};

use crate::acl::AccessControlList;

/// Maximum number of tags on an object.
pub const MAX_OBJECT_TAGS: usize = 10;

/// The access-relevant state of one object: owner, ACL and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// The object key.
    pub key: String,
    /// The object owner. May differ from the bucket owner.
    pub owner: Owner,
    /// The object ACL.
    pub acl: AccessControlList,
    /// The object tag set, readable by policies as `s3:ExistingObjectTag/<key>`.
    pub tags: BTreeMap<String, String>,
    /// When the object was last written.
    pub last_modified: DateTime<Utc>,
}

impl ObjectEntry {
    /// Create an object entry with no tags.
    #[must_use]
    pub fn new(key: impl Into<String>, owner: Owner, acl: AccessControlList) -> Self {
        Self {
            key: key.into(),
            owner,
            acl,
            tags: BTreeMap::new(),
            last_modified: Utc::now(),
        }
    }

    /// Builder-style tag replacement.
    #[must_use]
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}
