//! Bucket configuration operation handlers.
//!
//! Implements public access block, bucket policy, policy status and
//! ownership controls operations. Every `Put` validates its input in full
//! before the bucket snapshot is swapped; every `Get` on an absent
//! configuration fails with the matching not-found error.

use std::sync::Arc;

use tracing::debug;

use crate::action::S3Action;
use crate::context::RequestContext;
use crate::error::{AccessError, AccessResult};
use crate::policy::BucketPolicy;
use crate::public_access_block::{PublicAccessBlockConfiguration, PublicAccessBlockGate};
use crate::service::AccessService;
use crate::state::ObjectOwnership;

impl AccessService {
    // -----------------------------------------------------------------------
    // Public access block
    // -----------------------------------------------------------------------

    /// Get the public access block configuration of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchPublicAccessBlockConfiguration`] when
    /// none has been put.
    pub fn get_public_access_block(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<PublicAccessBlockConfiguration> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetPublicAccessBlock)?;
        req.snapshot
            .public_access_block
            .ok_or(AccessError::NoSuchPublicAccessBlockConfiguration)
    }

    /// Create or overwrite the public access block configuration of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn put_public_access_block(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        config: PublicAccessBlockConfiguration,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::PutPublicAccessBlock)?;
        req.bucket.update(|snapshot| {
            snapshot.public_access_block = Some(config);
            Ok(())
        })?;
        debug!(bucket = %bucket_name, ?config, "put_public_access_block completed");
        Ok(())
    }

    /// Remove the public access block configuration of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_public_access_block(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::DeletePublicAccessBlock)?;
        req.bucket.update(|snapshot| {
            snapshot.public_access_block = None;
            Ok(())
        })?;
        debug!(bucket = %bucket_name, "delete_public_access_block completed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    /// Get the bucket policy as it was written.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucketPolicy`] when none has been put.
    pub fn get_bucket_policy(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<String> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetBucketPolicy)?;
        req.snapshot
            .policy
            .as_ref()
            .map(|policy| policy.raw().to_owned())
            .ok_or(AccessError::NoSuchBucketPolicy)
    }

    /// Validate and store a bucket policy.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedPolicy`] for an invalid document and
    /// [`AccessError::AccessDenied`] when `BlockPublicPolicy` rejects it.
    pub fn put_bucket_policy(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        text: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::PutBucketPolicy)?;
        let policy = BucketPolicy::parse(text, bucket_name)?;
        let content_aware = self.config.content_aware_block_public_policy;

        req.bucket.update(|snapshot| {
            PublicAccessBlockGate::new(snapshot.public_access_block.as_ref())
                .check_policy_write(&policy, content_aware)?;
            snapshot.policy = Some(Arc::new(policy));
            Ok(())
        })?;

        debug!(bucket = %bucket_name, "put_bucket_policy completed");
        Ok(())
    }

    /// Remove the bucket policy.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_bucket_policy(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::DeleteBucketPolicy)?;
        req.bucket.update(|snapshot| {
            snapshot.policy = None;
            Ok(())
        })?;
        debug!(bucket = %bucket_name, "delete_bucket_policy completed");
        Ok(())
    }

    /// Whether the bucket policy makes the bucket public.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucketPolicy`] when none has been put.
    pub fn get_bucket_policy_status(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<bool> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetBucketPolicyStatus)?;
        req.snapshot
            .policy
            .as_ref()
            .map(|policy| policy.is_public())
            .ok_or(AccessError::NoSuchBucketPolicy)
    }

    // -----------------------------------------------------------------------
    // Ownership controls
    // -----------------------------------------------------------------------

    /// Get the ownership controls of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::OwnershipControlsNotFoundError`] when none have
    /// been put.
    pub fn get_bucket_ownership_controls(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<ObjectOwnership> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetBucketOwnershipControls)?;
        req.snapshot
            .ownership
            .ok_or(AccessError::OwnershipControlsNotFoundError)
    }

    /// Set the ownership controls of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn put_bucket_ownership_controls(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        ownership: ObjectOwnership,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::PutBucketOwnershipControls)?;
        req.bucket.update(|snapshot| {
            snapshot.ownership = Some(ownership);
            Ok(())
        })?;
        debug!(bucket = %bucket_name, %ownership, "put_bucket_ownership_controls completed");
        Ok(())
    }

    /// Remove the ownership controls of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_bucket_ownership_controls(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::DeleteBucketOwnershipControls)?;
        req.bucket.update(|snapshot| {
            snapshot.ownership = None;
            Ok(())
        })?;
        debug!(bucket = %bucket_name, "delete_bucket_ownership_controls completed");
        Ok(())
    }
}
