//! Public access block gate.
//!
//! The gate sits in front of every ACL write, every policy write and every
//! ACL or policy evaluation for a bucket. With no configuration attached it
//! is a no-op.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::acl::Grant;
use crate::error::{AccessError, AccessResult};
use crate::policy::BucketPolicy;

/// Public access block settings of a bucket.
///
/// An absent configuration is distinct from one with every flag off: only
/// the former makes `GetPublicAccessBlock` fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlockConfiguration {
    /// Reject ACL writes that grant access to public groups.
    #[serde(default)]
    pub block_public_acls: bool,
    /// Skip public grants when evaluating ACLs.
    #[serde(default)]
    pub ignore_public_acls: bool,
    /// Reject bucket policy writes.
    #[serde(default)]
    pub block_public_policy: bool,
    /// Restrict policy-based access to the bucket owner when the policy is public.
    #[serde(default)]
    pub restrict_public_buckets: bool,
}

/// Enforces a bucket's [`PublicAccessBlockConfiguration`], if any.
#[derive(Debug, Clone, Copy)]
pub struct PublicAccessBlockGate<'a> {
    config: Option<&'a PublicAccessBlockConfiguration>,
}

impl<'a> PublicAccessBlockGate<'a> {
    /// Create a gate for an optional configuration.
    #[must_use]
    pub fn new(config: Option<&'a PublicAccessBlockConfiguration>) -> Self {
        Self { config }
    }

    /// Check an ACL about to be written (canned or explicit grants).
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] when `BlockPublicAcls` is set and
    /// a grant names `AllUsers` or `AuthenticatedUsers`.
    pub fn check_acl_write(&self, grants: &[Grant]) -> AccessResult<()> {
        if self.config.is_some_and(|c| c.block_public_acls) && grants.iter().any(Grant::is_public) {
            warn!("public ACL rejected by BlockPublicAcls");
            return Err(AccessError::AccessDenied);
        }
        Ok(())
    }

    /// Check a bucket policy about to be written.
    ///
    /// With `content_aware` off, `BlockPublicPolicy` rejects every policy;
    /// with it on, only policies that are public.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AccessDenied`] when the write is blocked.
    pub fn check_policy_write(
        &self,
        policy: &BucketPolicy,
        content_aware: bool,
    ) -> AccessResult<()> {
        if self.config.is_some_and(|c| c.block_public_policy)
            && (!content_aware || policy.is_public())
        {
            warn!(content_aware, "bucket policy rejected by BlockPublicPolicy");
            return Err(AccessError::AccessDenied);
        }
        Ok(())
    }

    /// Whether public grants must be skipped during ACL evaluation.
    #[must_use]
    pub fn ignore_public_acls(&self) -> bool {
        self.config.is_some_and(|c| c.ignore_public_acls)
    }

    /// Whether a public bucket (through its policy or a non-ignored public
    /// ACL) only admits its owner.
    #[must_use]
    pub fn restrict_public_buckets(&self) -> bool {
        self.config.is_some_and(|c| c.restrict_public_buckets)
    }
}
