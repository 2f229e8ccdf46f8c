//! Bucket registry.
//!
//! [`AccessStore`] maps bucket names to [`BucketEntry`]s and enforces
//! global bucket-name uniqueness. All operations are thread-safe via
//! `DashMap`.

use std::sync::Arc;

use bucketgate_core::Owner;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use super::bucket::{BucketEntry, ObjectOwnership};
use crate::acl::AccessControlList;
use crate::error::{AccessError, AccessResult};

/// All buckets known to the engine.
#[derive(Debug, Default)]
pub struct AccessStore {
    buckets: DashMap<String, Arc<BucketEntry>>,
}

impl AccessStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// - [`AccessError::BucketAlreadyOwnedByYou`] if `owner` already owns a
    ///   bucket with this name.
    /// - [`AccessError::BucketAlreadyExists`] if another user owns it.
    pub fn create_bucket(
        &self,
        name: &str,
        owner: Owner,
        acl: AccessControlList,
        ownership: Option<ObjectOwnership>,
    ) -> AccessResult<Arc<BucketEntry>> {
        match self.buckets.entry(name.to_owned()) {
            Entry::Occupied(existing) => {
                if existing.get().snapshot().owner.id == owner.id {
                    Err(AccessError::BucketAlreadyOwnedByYou {
                        bucket: name.to_owned(),
                    })
                } else {
                    Err(AccessError::BucketAlreadyExists {
                        bucket: name.to_owned(),
                    })
                }
            }
            Entry::Vacant(slot) => {
                let bucket = Arc::new(BucketEntry::new(name, owner, acl, ownership));
                slot.insert(Arc::clone(&bucket));
                info!(bucket = %name, "bucket created");
                Ok(bucket)
            }
        }
    }

    /// Look up a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] if the bucket does not exist.
    pub fn get_bucket(&self, name: &str) -> AccessResult<Arc<BucketEntry>> {
        self.buckets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AccessError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    /// Delete a bucket together with its objects and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] if the bucket does not exist.
    pub fn delete_bucket(&self, name: &str) -> AccessResult<()> {
        let (_, bucket) = self
            .buckets
            .remove(name)
            .ok_or_else(|| AccessError::NoSuchBucket {
                bucket: name.to_owned(),
            })?;
        info!(bucket = %name, objects = bucket.object_count(), "bucket deleted");
        Ok(())
    }

    /// Names of the buckets owned by `owner`, sorted.
    #[must_use]
    pub fn list_buckets(&self, owner: &Owner) -> Vec<String> {
        let mut names: Vec<String> = self
            .buckets
            .iter()
            .filter(|entry| entry.value().snapshot().owner.id == owner.id)
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the store holds no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
