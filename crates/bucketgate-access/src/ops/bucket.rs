//! Bucket and object lifecycle handlers.
//!
//! Objects carry no data here; only the state that access decisions need
//! (owner, ACL, tags) is created and destroyed.

use std::collections::BTreeMap;

use bucketgate_core::Owner;
use tracing::{debug, info};

use super::acl::{AclSource, check_acl_write};
use super::tagging::validate_tags;
use crate::acl::AccessControlList;
use crate::action::S3Action;
use crate::canned::CannedAcl;
use crate::context::RequestContext;
use crate::error::{AccessError, AccessResult};
use crate::state::{BucketSnapshot, ObjectEntry, ObjectOwnership};
use crate::service::AccessService;

/// One key that could not be deleted by [`AccessService::delete_objects`].
#[derive(Debug)]
pub struct DeleteError {
    /// The key.
    pub key: String,
    /// Why it was not deleted.
    pub error: AccessError,
}

/// Outcome of a multi-object delete.
#[derive(Debug, Default)]
pub struct DeleteObjectsOutput {
    /// Keys reported as deleted, whether or not they existed.
    pub deleted: Vec<String>,
    /// Keys the caller was not allowed to delete.
    pub errors: Vec<DeleteError>,
}

impl AccessService {
    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Create a bucket owned by the caller.
    ///
    /// # Errors
    ///
    /// - [`AccessError::AccessDenied`] for anonymous callers.
    /// - [`AccessError::BucketAlreadyExists`] /
    ///   [`AccessError::BucketAlreadyOwnedByYou`] for a taken name.
    /// - [`AccessError::AccessControlListNotSupported`] for a non-owner ACL
    ///   on a `BucketOwnerEnforced` bucket.
    pub fn create_bucket(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        acl: Option<AclSource>,
        ownership: Option<ObjectOwnership>,
    ) -> AccessResult<()> {
        let owner = ctx.caller().cloned().ok_or(AccessError::AccessDenied)?;
        let acl = match acl {
            Some(source) => self.resolve_acl(source, &owner, None)?,
            None => AccessControlList::private(owner.clone()),
        };

        if ownership == Some(ObjectOwnership::BucketOwnerEnforced) {
            let draft = BucketSnapshot {
                name: bucket_name.to_owned(),
                owner: owner.clone(),
                acl: AccessControlList::private(owner.clone()),
                public_access_block: None,
                policy: None,
                cors: None,
                ownership,
                created_at: ctx.now,
            };
            check_acl_write(&draft, &acl)?;
        }

        self.store.create_bucket(bucket_name, owner, acl, ownership)?;
        debug!(bucket = %bucket_name, "create_bucket completed");
        Ok(())
    }

    /// List the buckets owned by the caller, by name.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] for anonymous callers.
    pub fn list_buckets(&self, ctx: &RequestContext) -> AccessResult<Vec<String>> {
        let owner = ctx.caller().ok_or(AccessError::AccessDenied)?;
        Ok(self.store.list_buckets(owner))
    }

    /// Delete a bucket together with its objects and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_bucket(&self, ctx: &RequestContext, bucket_name: &str) -> AccessResult<()> {
        self.authorize(ctx, bucket_name, None, S3Action::DeleteBucket)?;
        self.store.delete_bucket(bucket_name)?;
        debug!(bucket = %bucket_name, "delete_bucket completed");
        Ok(())
    }

    /// Check that a bucket exists and the caller may list it.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn head_bucket(&self, ctx: &RequestContext, bucket_name: &str) -> AccessResult<()> {
        self.authorize(ctx, bucket_name, None, S3Action::HeadBucket)?;
        Ok(())
    }

    /// List the object keys of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn list_objects(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<Vec<String>> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::ListObjects)?;
        Ok(req.bucket.object_keys())
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Create or overwrite an object.
    ///
    /// The object is owned by the bucket owner when ACLs are disabled, when
    /// the bucket prefers bucket ownership and the writer grants
    /// `bucket-owner-full-control`, or when the writer is anonymous.
    /// Otherwise the writer owns it.
    ///
    /// # Errors
    ///
    /// Returns an access denial, an ACL validation error, or
    /// [`AccessError::InvalidArgument`] for an invalid tag set.
    pub fn put_object(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
        acl: Option<AclSource>,
        tags: BTreeMap<String, String>,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::PutObject)?;
        validate_tags(&tags)?;

        // Checked and stored under the live snapshot.
        req.bucket.with_snapshot(|snapshot| {
            let owner = object_owner(snapshot, ctx.caller(), acl.as_ref());
            let acl = match acl {
                Some(source) => self.resolve_acl(source, &owner, Some(&snapshot.owner))?,
                None => AccessControlList::private(owner.clone()),
            };
            check_acl_write(snapshot, &acl)?;

            req.bucket
                .put_object(ObjectEntry::new(key, owner, acl).with_tags(tags));
            Ok(())
        })?;
        debug!(bucket = %bucket_name, key = %key, "put_object completed");
        Ok(())
    }

    /// Read an object's access state.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`], [`AccessError::NoSuchKey`] or
    /// an access denial.
    pub fn get_object(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<ObjectEntry> {
        self.read_object(ctx, bucket_name, key, S3Action::GetObject)
    }

    /// Like [`get_object`](Self::get_object), authorized as `HeadObject`.
    ///
    /// # Errors
    ///
    /// As [`get_object`](Self::get_object).
    pub fn head_object(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<ObjectEntry> {
        self.read_object(ctx, bucket_name, key, S3Action::HeadObject)
    }

    fn read_object(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
        action: S3Action,
    ) -> AccessResult<ObjectEntry> {
        let req = self.authorize(ctx, bucket_name, Some(key), action)?;
        req.object.ok_or_else(|| AccessError::NoSuchKey {
            key: key.to_owned(),
        })
    }

    /// Delete an object. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_object(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::DeleteObject)?;
        let existed = req.bucket.remove_object(key);
        debug!(bucket = %bucket_name, key = %key, existed, "delete_object completed");
        Ok(())
    }

    /// Delete several objects, reporting each key individually.
    ///
    /// Every key the caller may delete is reported as deleted, present or
    /// not, so repeating the call yields the same result.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] if the bucket does not exist.
    pub fn delete_objects(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        keys: &[&str],
    ) -> AccessResult<DeleteObjectsOutput> {
        let bucket = self.store.get_bucket(bucket_name)?;
        let mut output = DeleteObjectsOutput::default();

        for key in keys {
            match self.delete_object(ctx, bucket.name(), key) {
                Ok(()) => output.deleted.push((*key).to_owned()),
                Err(error) => output.errors.push(DeleteError {
                    key: (*key).to_owned(),
                    error,
                }),
            }
        }

        info!(
            bucket = %bucket_name,
            deleted = output.deleted.len(),
            errors = output.errors.len(),
            "delete_objects completed"
        );
        Ok(output)
    }
}

/// Decide who owns a newly written object.
fn object_owner(
    snapshot: &BucketSnapshot,
    writer: Option<&Owner>,
    acl: Option<&AclSource>,
) -> Owner {
    let bucket_owner_wins = match snapshot.ownership {
        Some(ObjectOwnership::BucketOwnerEnforced) => true,
        Some(ObjectOwnership::BucketOwnerPreferred) => {
            acl == Some(&AclSource::Canned(CannedAcl::BucketOwnerFullControl))
        }
        Some(ObjectOwnership::ObjectWriter) | None => false,
    };

    match writer {
        Some(writer) if !bucket_owner_wins => writer.clone(),
        _ => snapshot.owner.clone(),
    }
}
