//! CORS configuration and request handlers.
//!
//! Preflight and actual cross-origin evaluation are unauthenticated: they
//! read the bucket's compiled rules and never consult ACLs or policies.

use std::sync::Arc;

use tracing::debug;

use crate::action::S3Action;
use crate::context::RequestContext;
use crate::cors::{CorsConfiguration, CorsHeaders, CorsMatcher};
use crate::error::{AccessError, AccessResult};
use crate::service::AccessService;

impl AccessService {
    /// Get the CORS configuration of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchCorsConfiguration`] when none has been put.
    pub fn get_bucket_cors(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<CorsConfiguration> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetBucketCors)?;
        req.snapshot
            .cors
            .as_ref()
            .map(|cors| cors.configuration().clone())
            .ok_or(AccessError::NoSuchCorsConfiguration)
    }

    /// Validate, compile and store a CORS configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedXml`] or [`AccessError::InvalidRequest`]
    /// for an invalid configuration.
    pub fn put_bucket_cors(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        config: CorsConfiguration,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::PutBucketCors)?;
        let rule_count = config.rules.len();
        let matcher = Arc::new(config.compile(self.config.max_cors_rules)?);

        req.bucket.update(|snapshot| {
            snapshot.cors = Some(matcher);
            Ok(())
        })?;
        debug!(bucket = %bucket_name, rule_count, "put_bucket_cors completed");
        Ok(())
    }

    /// Remove the CORS configuration of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn delete_bucket_cors(&self, ctx: &RequestContext, bucket_name: &str) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::DeleteBucketCors)?;
        req.bucket.update(|snapshot| {
            snapshot.cors = None;
            Ok(())
        })?;
        debug!(bucket = %bucket_name, "delete_bucket_cors completed");
        Ok(())
    }

    /// Answer a CORS preflight (`OPTIONS`) request.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`], [`AccessError::BadRequest`]
    /// without an origin, or [`AccessError::CorsForbidden`].
    pub fn cors_preflight(
        &self,
        bucket_name: &str,
        origin: Option<&str>,
        request_method: Option<&str>,
        request_headers: &[String],
    ) -> AccessResult<CorsHeaders> {
        let snapshot = self.store.get_bucket(bucket_name)?.snapshot();
        CorsMatcher::evaluate_preflight(
            snapshot.cors.as_deref(),
            origin,
            request_method,
            request_headers,
        )
    }

    /// CORS response headers for an actual cross-origin request.
    ///
    /// `Ok(None)` means the request proceeds without CORS headers.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] if the bucket does not exist.
    pub fn cors_actual(
        &self,
        bucket_name: &str,
        origin: Option<&str>,
        method: &str,
    ) -> AccessResult<Option<CorsHeaders>> {
        let snapshot = self.store.get_bucket(bucket_name)?.snapshot();
        Ok(CorsMatcher::evaluate_actual(snapshot.cors.as_deref(), origin, method))
    }
}
