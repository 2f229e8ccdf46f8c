//! The access decision pipeline.
//!
//! For one request against one bucket snapshot the stages run in order:
//!
//! 1. pre-signed URL expiry, rejected with `AuthorizationQueryParametersError`
//! 2. bucket policy, where an explicit `Deny` ends evaluation
//! 3. `RestrictPublicBuckets`, which refuses non-owners of a public bucket
//! 4. a policy `Allow`, which grants access
//! 5. the ACL of the bucket or object, filtered by `IgnorePublicAcls`
//!
//! The pipeline only reads the snapshot and never blocks.

use bucketgate_auth::Principal;
use tracing::debug;

use crate::acl::Permission;
use crate::action::{AclRequirement, S3Action};
use crate::context::RequestContext;
use crate::error::{AccessError, AccessResult};
use crate::policy::{ConditionContext, PolicyDecision, PolicyRequest, resource_arn};
use crate::public_access_block::PublicAccessBlockGate;
use crate::state::{BucketSnapshot, ObjectEntry};

/// Why a request was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBasis {
    /// A bucket policy statement allowed it.
    Policy,
    /// An ACL grant (or resource ownership) allowed it.
    Acl,
    /// The caller owns the bucket.
    BucketOwner,
}

/// A successful access decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// The caller, resolved against the bucket owner.
    pub principal: Principal,
    /// The stage that allowed the request.
    pub basis: AccessBasis,
}

/// Decide whether a request may perform `action` on a bucket or one of its objects.
///
/// `object` is the current state of the object named by `key`, if it exists.
///
/// # Errors
///
/// - [`AccessError::AuthorizationQueryParametersError`] for an expired
///   pre-signed URL.
/// - [`AccessError::AccessDenied`] when a policy denies, a public bucket is
///   restricted, or neither policy nor ACL allows.
/// - [`AccessError::NoSuchKey`] when an object operation targets a missing
///   key and the caller may list the bucket (by policy or bucket ACL);
///   [`AccessError::AccessDenied`] otherwise.
pub fn authorize(
    bucket: &BucketSnapshot,
    object: Option<&ObjectEntry>,
    action: S3Action,
    key: Option<&str>,
    ctx: &RequestContext,
) -> AccessResult<Authorization> {
    if let Some(grant) = &ctx.identity.presigned {
        grant.validate(ctx.now)?;
    }

    let caller = ctx.identity.caller_id();
    let principal = Principal::resolve(caller, &bucket.owner.id);
    let gate = PublicAccessBlockGate::new(bucket.public_access_block.as_ref());

    let policy_decision = match &bucket.policy {
        Some(policy) => {
            let conditions = with_object_tags(&ctx.conditions, object);
            let resource = resource_arn(&bucket.name, key);
            policy.evaluate(&PolicyRequest {
                principal: &principal,
                action: action.policy_action(),
                resource: &resource,
                context: &conditions,
            })
        }
        None => PolicyDecision::NoOpinion,
    };

    if policy_decision == PolicyDecision::Deny {
        debug!(bucket = %bucket.name, %action, %principal, "denied by bucket policy");
        return Err(AccessError::AccessDenied);
    }

    if gate.restrict_public_buckets() && !principal.is_owner() && is_public(bucket, &gate) {
        debug!(bucket = %bucket.name, %action, %principal, "denied by RestrictPublicBuckets");
        return Err(AccessError::AccessDenied);
    }

    let ignore_public = gate.ignore_public_acls();
    let missing_object =
        object.is_none() && matches!(action.requirement(), AclRequirement::Object(_));
    if missing_object && policy_decision == PolicyDecision::Allow {
        let err = missing_key(bucket, &principal, key, &ctx.conditions, ignore_public);
        return Err(err);
    }

    if policy_decision == PolicyDecision::Allow {
        return Ok(Authorization {
            principal,
            basis: AccessBasis::Policy,
        });
    }

    let allowed = match action.requirement() {
        AclRequirement::BucketOwner => {
            return if principal.is_owner() {
                Ok(Authorization {
                    principal,
                    basis: AccessBasis::BucketOwner,
                })
            } else {
                debug!(bucket = %bucket.name, %action, %principal, "owner-only operation denied");
                Err(AccessError::AccessDenied)
            };
        }
        AclRequirement::Bucket(permission) => bucket
            .acl
            .evaluate_with(&principal, permission, ignore_public)
            .is_allow(),
        AclRequirement::Object(permission) => match object {
            Some(object) => {
                let object_principal = Principal::resolve(caller, &object.owner.id);
                object
                    .acl
                    .evaluate_with(&object_principal, permission, ignore_public)
                    .is_allow()
            }
            None => {
                let err = missing_key(bucket, &principal, key, &ctx.conditions, ignore_public);
                return Err(err);
            }
        },
    };

    if allowed {
        Ok(Authorization {
            principal,
            basis: AccessBasis::Acl,
        })
    } else {
        debug!(bucket = %bucket.name, %action, %principal, key, "denied by ACL");
        Err(AccessError::AccessDenied)
    }
}

/// The error for an object operation on a missing key.
///
/// Only callers that may list the bucket, through the policy or the bucket
/// ACL, learn that the key does not exist.
fn missing_key(
    bucket: &BucketSnapshot,
    principal: &Principal,
    key: Option<&str>,
    conditions: &ConditionContext,
    ignore_public: bool,
) -> AccessError {
    let list_decision = match &bucket.policy {
        Some(policy) => policy.evaluate(&PolicyRequest {
            principal,
            action: S3Action::ListObjects.policy_action(),
            resource: &resource_arn(&bucket.name, None),
            context: conditions,
        }),
        None => PolicyDecision::NoOpinion,
    };
    let may_list = match list_decision {
        PolicyDecision::Allow => true,
        PolicyDecision::Deny => false,
        PolicyDecision::NoOpinion => bucket
            .acl
            .evaluate_with(principal, Permission::Read, ignore_public)
            .is_allow(),
    };

    if may_list {
        AccessError::NoSuchKey {
            key: key.unwrap_or_default().to_owned(),
        }
    } else {
        AccessError::AccessDenied
    }
}

/// Whether the bucket is public through its policy or its (non-ignored) ACL.
fn is_public(bucket: &BucketSnapshot, gate: &PublicAccessBlockGate<'_>) -> bool {
    bucket.policy.as_ref().is_some_and(|p| p.is_public())
        || (!gate.ignore_public_acls() && bucket.acl.has_public_grants())
}

/// Add `s3:ExistingObjectTag/<key>` condition keys for an existing object.
fn with_object_tags(base: &ConditionContext, object: Option<&ObjectEntry>) -> ConditionContext {
    let mut conditions = base.clone();
    if let Some(object) = object {
        for (key, value) in &object.tags {
            conditions.insert(&format!("s3:ExistingObjectTag/{key}"), value.clone());
        }
    }
    conditions
}
