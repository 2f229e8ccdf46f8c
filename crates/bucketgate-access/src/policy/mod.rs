//! Bucket policy evaluation.
//!
//! Evaluation follows the usual precedence: any matching `Deny` statement
//! wins, otherwise any matching `Allow` statement allows, otherwise the
//! policy has no opinion and the decision falls through to the ACLs.

pub mod condition;
mod document;
pub mod wildcard;

use bucketgate_auth::Principal;
use tracing::debug;

pub use self::condition::{Condition, ConditionContext, ConditionOperator};
pub use self::document::{BucketPolicy, Effect, S3_ARN_PREFIX, Statement};

/// Outcome of evaluating a bucket policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// A matching statement allows the request.
    Allow,
    /// A matching statement denies the request.
    Deny,
    /// No statement matches.
    NoOpinion,
}

/// The request as a policy sees it.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    /// The caller, resolved against the bucket owner.
    pub principal: &'a Principal,
    /// The policy action name, e.g. `s3:GetObject`.
    pub action: &'a str,
    /// The resource ARN, see [`resource_arn`].
    pub resource: &'a str,
    /// Condition keys of the request.
    pub context: &'a ConditionContext,
}

/// Build the ARN of a bucket, or of an object when `key` is given.
///
/// ```
/// use bucketgate_access::policy::resource_arn;
///
/// assert_eq!(resource_arn("photos", None), "arn:aws:s3:::photos");
/// assert_eq!(resource_arn("photos", Some("a/b.jpg")), "arn:aws:s3:::photos/a/b.jpg");
/// ```
#[must_use]
pub fn resource_arn(bucket: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("{S3_ARN_PREFIX}{bucket}/{key}"),
        None => format!("{S3_ARN_PREFIX}{bucket}"),
    }
}

impl BucketPolicy {
    /// Evaluate the policy for a request.
    #[must_use]
    pub fn evaluate(&self, request: &PolicyRequest<'_>) -> PolicyDecision {
        let mut decision = PolicyDecision::NoOpinion;

        for statement in self.statements() {
            if !statement.applies_to(request) {
                continue;
            }
            match statement.effect() {
                Effect::Deny => {
                    debug!(
                        sid = statement.sid().unwrap_or_default(),
                        action = request.action,
                        resource = request.resource,
                        "policy_explicit_deny"
                    );
                    return PolicyDecision::Deny;
                }
                Effect::Allow => decision = PolicyDecision::Allow,
            }
        }

        decision
    }

    /// Whether any statement grants unconditional access to everyone.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.statements().iter().any(Statement::is_public)
    }
}
