//! The access-control service.
//!
//! [`AccessService`] owns the bucket store and the credential provider.
//! Individual operations are implemented in the [`crate::ops`] submodules;
//! each one authorizes through [`AccessService::authorize`] before touching
//! state.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use bucketgate_auth::{CredentialProvider, PrincipalResolver};

use crate::action::S3Action;
use crate::config::AccessConfig;
use crate::context::RequestContext;
use crate::error::AccessResult;
use crate::pipeline::{self, Authorization};
use crate::state::{AccessStore, BucketEntry, BucketSnapshot, ObjectEntry};

/// The access-control engine for a set of buckets.
///
/// All fields are `Arc`-wrapped for cheap cloning and shared ownership
/// across request handlers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bucketgate_access::{AccessConfig, AccessService, RequestContext};
/// use bucketgate_auth::StaticCredentialProvider;
/// use bucketgate_core::Owner;
///
/// let owner = Owner::default();
/// let provider = StaticCredentialProvider::new(vec![("AKID".to_owned(), owner.clone())]);
/// let service = AccessService::new(AccessConfig::default(), Arc::new(provider));
///
/// let ctx = RequestContext::user(owner);
/// service.create_bucket(&ctx, "photos", None, None).unwrap();
/// assert!(service.head_bucket(&RequestContext::anonymous(), "photos").is_err());
/// ```
#[derive(Clone)]
pub struct AccessService {
    pub(crate) config: Arc<AccessConfig>,
    pub(crate) store: Arc<AccessStore>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for AccessService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessService")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// A request that passed the access pipeline, with the state it was
/// decided against.
#[derive(Debug, Clone)]
pub struct AuthorizedRequest {
    /// The bucket.
    pub bucket: Arc<BucketEntry>,
    /// The configuration snapshot the decision used.
    pub snapshot: Arc<BucketSnapshot>,
    /// The target object, if it exists.
    pub object: Option<ObjectEntry>,
    /// The decision.
    pub authorization: Authorization,
}

impl AccessService {
    /// Create a service with an empty store.
    #[must_use]
    pub fn new(config: AccessConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(AccessStore::new()),
            credentials,
        }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Returns a reference to the bucket store.
    #[must_use]
    pub fn store(&self) -> &AccessStore {
        &self.store
    }

    /// A principal resolver sharing this service's credentials and limits.
    #[must_use]
    pub fn principal_resolver(&self) -> PrincipalResolver {
        PrincipalResolver::new(Arc::clone(&self.credentials))
            .with_max_presigned_expires(self.config.max_presigned_expires)
    }

    /// Build the request context of an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error when the request credentials cannot be identified.
    pub fn request_context(
        &self,
        parts: &http::request::Parts,
        source_ip: Option<IpAddr>,
    ) -> AccessResult<RequestContext> {
        RequestContext::from_request(&self.principal_resolver(), parts, source_ip)
    }

    /// Run the access pipeline for `action` on `bucket` (and `key`).
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`](crate::AccessError::NoSuchBucket)
    /// for a missing bucket, or the pipeline's denial.
    pub fn authorize(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        key: Option<&str>,
        action: S3Action,
    ) -> AccessResult<AuthorizedRequest> {
        let entry = self.store.get_bucket(bucket)?;
        let snapshot = entry.snapshot();
        let object = key.and_then(|k| entry.object(k));
        let authorization = pipeline::authorize(&snapshot, object.as_ref(), action, key, ctx)?;

        Ok(AuthorizedRequest {
            bucket: entry,
            snapshot,
            object,
            authorization,
        })
    }
}
