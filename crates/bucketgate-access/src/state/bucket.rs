//! Per-bucket access state.
//!
//! Bucket configuration lives in an immutable [`BucketSnapshot`] behind an
//! `Arc`. Readers clone the `Arc` once per request and evaluate against it
//! without holding any lock; writers build a new snapshot and swap it in
//! under a short `parking_lot::RwLock` write lock, so a reader sees either
//! the old configuration or the new one in full. Object writes that must
//! agree with the live configuration run under the read lock through
//! [`BucketEntry::with_snapshot`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bucketgate_core::Owner;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::object::ObjectEntry;
use crate::acl::AccessControlList;
use crate::cors::CorsMatcher;
use crate::error::{AccessError, AccessResult};
use crate::policy::BucketPolicy;
use crate::public_access_block::PublicAccessBlockConfiguration;

// ---------------------------------------------------------------------------
// ObjectOwnership
// ---------------------------------------------------------------------------

/// Bucket ownership controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectOwnership {
    /// Objects uploaded with `bucket-owner-full-control` are owned by the
    /// bucket owner; others by the writer.
    BucketOwnerPreferred,
    /// The writer owns the objects it uploads.
    ObjectWriter,
    /// ACLs are disabled and the bucket owner owns every object.
    BucketOwnerEnforced,
}

impl ObjectOwnership {
    /// The wire name of the setting.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BucketOwnerPreferred => "BucketOwnerPreferred",
            Self::ObjectWriter => "ObjectWriter",
            Self::BucketOwnerEnforced => "BucketOwnerEnforced",
        }
    }
}

impl fmt::Display for ObjectOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectOwnership {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BucketOwnerPreferred" => Ok(Self::BucketOwnerPreferred),
            "ObjectWriter" => Ok(Self::ObjectWriter),
            "BucketOwnerEnforced" => Ok(Self::BucketOwnerEnforced),
            other => Err(AccessError::malformed_xml(format!(
                "unknown object ownership {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// BucketSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time view of a bucket's access configuration.
#[derive(Debug, Clone)]
pub struct BucketSnapshot {
    /// The bucket name.
    pub name: String,
    /// The bucket owner.
    pub owner: Owner,
    /// The bucket ACL.
    pub acl: AccessControlList,
    /// Public access block settings, absent until first put.
    pub public_access_block: Option<PublicAccessBlockConfiguration>,
    /// The bucket policy, absent until first put.
    pub policy: Option<Arc<BucketPolicy>>,
    /// The compiled CORS configuration, absent until first put.
    pub cors: Option<Arc<CorsMatcher>>,
    /// Ownership controls, absent until first put.
    pub ownership: Option<ObjectOwnership>,
    /// When the bucket was created.
    pub created_at: DateTime<Utc>,
}

impl BucketSnapshot {
    /// Whether ACLs are disabled by `BucketOwnerEnforced`.
    #[must_use]
    pub fn acls_disabled(&self) -> bool {
        self.ownership == Some(ObjectOwnership::BucketOwnerEnforced)
    }
}

// ---------------------------------------------------------------------------
// BucketEntry
// ---------------------------------------------------------------------------

/// A bucket: its configuration snapshot and its objects.
pub struct BucketEntry {
    name: String,
    snapshot: RwLock<Arc<BucketSnapshot>>,
    objects: DashMap<String, ObjectEntry>,
}

impl fmt::Debug for BucketEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketEntry")
            .field("name", &self.name)
            .field("object_count", &self.objects.len())
            .finish_non_exhaustive()
    }
}

impl BucketEntry {
    /// Create a bucket with no optional configuration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        owner: Owner,
        acl: AccessControlList,
        ownership: Option<ObjectOwnership>,
    ) -> Self {
        let name = name.into();
        let snapshot = BucketSnapshot {
            name: name.clone(),
            owner,
            acl,
            public_access_block: None,
            policy: None,
            cors: None,
            ownership,
            created_at: Utc::now(),
        };
        Self {
            name,
            snapshot: RwLock::new(Arc::new(snapshot)),
            objects: DashMap::new(),
        }
    }

    /// The bucket name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current configuration snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<BucketSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Run `f` against the current snapshot while holding the read lock.
    ///
    /// No [`update`](Self::update) can commit until `f` returns, so a check
    /// made by `f` still holds for whatever `f` writes alongside it.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn with_snapshot<T>(
        &self,
        f: impl FnOnce(&BucketSnapshot) -> AccessResult<T>,
    ) -> AccessResult<T> {
        let guard = self.snapshot.read();
        f(&guard)
    }

    /// Replace the snapshot with a modified copy.
    ///
    /// `f` runs on a private copy while the write lock is held; the copy is
    /// published only if `f` succeeds.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns; the snapshot is left unchanged.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut BucketSnapshot) -> AccessResult<T>,
    ) -> AccessResult<T> {
        let mut guard = self.snapshot.write();
        let mut next = BucketSnapshot::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        debug!(bucket = %self.name, "bucket snapshot replaced");
        Ok(out)
    }

    /// A copy of an object's state.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<ObjectEntry> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or overwrite an object.
    pub fn put_object(&self, entry: ObjectEntry) {
        self.objects.insert(entry.key.clone(), entry);
    }

    /// Remove an object. Returns `false` if it did not exist.
    pub fn remove_object(&self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    /// Modify an object in place.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchKey`] if the object does not exist, or
    /// whatever `f` returns.
    pub fn update_object<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut ObjectEntry) -> AccessResult<T>,
    ) -> AccessResult<T> {
        let mut entry = self
            .objects
            .get_mut(key)
            .ok_or_else(|| AccessError::NoSuchKey {
                key: key.to_owned(),
            })?;
        let mut next = entry.value().clone();
        let out = f(&mut next)?;
        *entry.value_mut() = next;
        Ok(out)
    }

    /// Object keys in lexicographic order.
    #[must_use]
    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Number of objects in the bucket.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
