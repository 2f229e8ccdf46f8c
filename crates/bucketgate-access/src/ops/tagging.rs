//! Object tagging handlers.
//!
//! Tags matter to access control because bucket policies can condition on
//! them through `s3:ExistingObjectTag/<key>`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::action::S3Action;
use crate::context::RequestContext;
use crate::error::{AccessError, AccessResult};
use crate::service::AccessService;
use crate::state::MAX_OBJECT_TAGS;

const MAX_TAG_KEY_LEN: usize = 128;
const MAX_TAG_VALUE_LEN: usize = 256;

/// Validate an object tag set.
///
/// # Errors
///
/// Returns [`AccessError::InvalidArgument`] for more than ten tags, an empty
/// or over-long key, or an over-long value.
pub(crate) fn validate_tags(tags: &BTreeMap<String, String>) -> AccessResult<()> {
    if tags.len() > MAX_OBJECT_TAGS {
        return Err(AccessError::invalid_argument(format!(
            "Object tags cannot be greater than {MAX_OBJECT_TAGS}"
        )));
    }
    for (key, value) in tags {
        if key.is_empty() || key.chars().count() > MAX_TAG_KEY_LEN {
            return Err(AccessError::invalid_argument("The TagKey you have provided is invalid"));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(AccessError::invalid_argument("The TagValue you have provided is invalid"));
        }
    }
    Ok(())
}

impl AccessService {
    /// Get an object's tag set.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchKey`] or an access denial.
    pub fn get_object_tagging(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<BTreeMap<String, String>> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::GetObjectTagging)?;
        req.object.map(|object| object.tags).ok_or_else(|| AccessError::NoSuchKey {
            key: key.to_owned(),
        })
    }

    /// Replace an object's tag set.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchKey`], an access denial, or
    /// [`AccessError::InvalidArgument`] for an invalid tag set.
    pub fn put_object_tagging(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
        tags: BTreeMap<String, String>,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::PutObjectTagging)?;
        validate_tags(&tags)?;
        req.bucket.update_object(key, |object| {
            object.tags = tags;
            Ok(())
        })?;
        debug!(bucket = %bucket_name, key = %key, "put_object_tagging completed");
        Ok(())
    }

    /// Remove every tag of an object.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchKey`] or an access denial.
    pub fn delete_object_tagging(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::DeleteObjectTagging)?;
        req.bucket.update_object(key, |object| {
            object.tags.clear();
            Ok(())
        })?;
        debug!(bucket = %bucket_name, key = %key, "delete_object_tagging completed");
        Ok(())
    }
}
