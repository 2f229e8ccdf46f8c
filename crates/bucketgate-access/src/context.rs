//! Per-request inputs to the access decision.

use std::net::IpAddr;

use bucketgate_auth::{PrincipalResolver, RequestIdentity};
use bucketgate_core::Owner;
use chrono::{DateTime, Utc};

use crate::error::AccessResult;
use crate::policy::ConditionContext;

/// Who is calling, with which condition keys, at what time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The identified caller and pre-signed URL, if any.
    pub identity: RequestIdentity,
    /// Condition keys available to bucket policies.
    pub conditions: ConditionContext,
    /// The time the request is evaluated at.
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// A context for `identity` evaluated now, with no condition keys.
    #[must_use]
    pub fn new(identity: RequestIdentity) -> Self {
        Self {
            identity,
            conditions: ConditionContext::new(),
            now: Utc::now(),
        }
    }

    /// An anonymous request evaluated now.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(RequestIdentity::anonymous())
    }

    /// A request by `owner` evaluated now.
    #[must_use]
    pub fn user(owner: Owner) -> Self {
        Self::new(RequestIdentity::user(owner))
    }

    /// Replace the condition keys.
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionContext) -> Self {
        self.conditions = conditions;
        self
    }

    /// Evaluate the request at a fixed time.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Identify the caller of an HTTP request and collect its condition keys.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`](bucketgate_auth::AuthError) when the
    /// credentials cannot be parsed or the access key is unknown.
    pub fn from_request(
        resolver: &PrincipalResolver,
        parts: &http::request::Parts,
        source_ip: Option<IpAddr>,
    ) -> AccessResult<Self> {
        let identity = resolver.identify(parts)?;
        let conditions = ConditionContext::from_request_parts(parts, source_ip);
        Ok(Self::new(identity).with_conditions(conditions))
    }

    /// The authenticated caller, if any.
    #[must_use]
    pub fn caller(&self) -> Option<&Owner> {
        self.identity.caller.as_ref()
    }
}
