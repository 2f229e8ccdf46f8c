//! ACL operation handlers and ACL resolution.
//!
//! An ACL write arrives as a canned ACL, as `x-amz-grant-*` grants or as a
//! full access control policy. Whatever the form, it is resolved against
//! the resource owner, its grantees are checked against the credential
//! provider, and the public access block gate is consulted before anything
//! is stored.

use bucketgate_core::Owner;
use tracing::debug;

use crate::acl::{AccessControlList, Grant, Grantee, Permission, grants_from_headers};
use crate::action::S3Action;
use crate::canned::CannedAcl;
use crate::context::RequestContext;
use crate::error::{AccessError, AccessResult};
use crate::public_access_block::PublicAccessBlockGate;
use crate::service::AccessService;
use crate::state::BucketSnapshot;

/// The ways an ACL can be supplied on a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclSource {
    /// An `x-amz-acl` canned ACL.
    Canned(CannedAcl),
    /// Grants from `x-amz-grant-*` headers.
    Grants(Vec<Grant>),
    /// A full access control policy body. Its owner is ignored; the
    /// resource keeps its owner.
    Full(AccessControlList),
}

impl AclSource {
    /// Extract the ACL carried by request headers, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidRequest`] when both `x-amz-acl` and
    /// grant headers are present, and [`AccessError::InvalidArgument`] for
    /// an unknown canned ACL or a malformed grant header.
    pub fn from_headers(headers: &http::HeaderMap) -> AccessResult<Option<Self>> {
        let canned = headers
            .get("x-amz-acl")
            .map(|v| {
                v.to_str()
                    .map_err(|_| AccessError::invalid_argument("x-amz-acl is not valid text"))?
                    .parse::<CannedAcl>()
            })
            .transpose()?;
        let grants = grants_from_headers(headers)?;

        match (canned, grants) {
            (Some(_), Some(_)) => Err(AccessError::InvalidRequest {
                message: "Specifying both Canned ACLs and Header Grants is not allowed".to_owned(),
            }),
            (Some(canned), None) => Ok(Some(Self::Canned(canned))),
            (None, Some(grants)) => Ok(Some(Self::Grants(grants))),
            (None, None) => Ok(None),
        }
    }
}

impl AccessService {
    // -----------------------------------------------------------------------
    // Bucket ACL
    // -----------------------------------------------------------------------

    /// Get the ACL of a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`] or an access denial.
    pub fn get_bucket_acl(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
    ) -> AccessResult<AccessControlList> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::GetBucketAcl)?;
        Ok(req.snapshot.acl.clone())
    }

    /// Replace the ACL of a bucket.
    ///
    /// # Errors
    ///
    /// Returns an access denial, [`AccessError::AccessControlListNotSupported`]
    /// when ACLs are disabled, or [`AccessError::InvalidArgument`] for
    /// unknown grantees.
    pub fn put_bucket_acl(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        source: AclSource,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, None, S3Action::PutBucketAcl)?;

        req.bucket.update(|snapshot| {
            let acl = self.resolve_acl(source, &snapshot.owner, None)?;
            check_acl_write(snapshot, &acl)?;
            snapshot.acl = acl;
            Ok(())
        })?;

        debug!(bucket = %bucket_name, "put_bucket_acl completed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Object ACL
    // -----------------------------------------------------------------------

    /// Get the ACL of an object.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoSuchBucket`], [`AccessError::NoSuchKey`] or
    /// an access denial.
    pub fn get_object_acl(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
    ) -> AccessResult<AccessControlList> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::GetObjectAcl)?;
        req.object.map(|object| object.acl).ok_or_else(|| AccessError::NoSuchKey {
            key: key.to_owned(),
        })
    }

    /// Replace the ACL of an object.
    ///
    /// # Errors
    ///
    /// As [`put_bucket_acl`](Self::put_bucket_acl), plus
    /// [`AccessError::NoSuchKey`].
    pub fn put_object_acl(
        &self,
        ctx: &RequestContext,
        bucket_name: &str,
        key: &str,
        source: AclSource,
    ) -> AccessResult<()> {
        let req = self.authorize(ctx, bucket_name, Some(key), S3Action::PutObjectAcl)?;

        req.bucket.with_snapshot(|snapshot| {
            req.bucket.update_object(key, |object| {
                let acl = self.resolve_acl(source, &object.owner, Some(&snapshot.owner))?;
                check_acl_write(snapshot, &acl)?;
                object.acl = acl;
                Ok(())
            })
        })?;

        debug!(bucket = %bucket_name, key = %key, "put_object_acl completed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Turn an [`AclSource`] into an ACL owned by `owner`.
    ///
    /// Canonical-user grantees must be known users (or one of the owners);
    /// email grantees are replaced by the canonical user they belong to.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidArgument`] for unknown grantees.
    pub fn resolve_acl(
        &self,
        source: AclSource,
        owner: &Owner,
        bucket_owner: Option<&Owner>,
    ) -> AccessResult<AccessControlList> {
        let grants = match source {
            AclSource::Canned(canned) => return Ok(canned.to_acl(owner, bucket_owner)),
            AclSource::Grants(grants) => grants,
            AclSource::Full(acl) => acl.grants,
        };

        let known = |id: &bucketgate_core::CanonicalUserId| -> Option<Owner> {
            [Some(owner), bucket_owner]
                .into_iter()
                .flatten()
                .find(|o| &o.id == id)
                .cloned()
                .or_else(|| self.credentials.user_by_id(id))
        };

        let grants = grants
            .into_iter()
            .map(|grant| {
                let grantee = match grant.grantee {
                    Grantee::CanonicalUser { id, display_name } => {
                        let user = known(&id).ok_or_else(|| {
                            AccessError::invalid_argument(format!("Invalid id {id}"))
                        })?;
                        Grantee::CanonicalUser {
                            id,
                            display_name: display_name.or(Some(user.display_name)),
                        }
                    }
                    Grantee::Email { address } => {
                        let user = self.credentials.user_by_email(&address).ok_or_else(|| {
                            AccessError::invalid_argument(format!(
                                "Invalid email address {address}"
                            ))
                        })?;
                        Grantee::user(&user)
                    }
                    group @ Grantee::Group { .. } => group,
                };
                Ok(Grant::new(grantee, grant.permission))
            })
            .collect::<AccessResult<Vec<_>>>()?;

        Ok(AccessControlList::new(owner.clone(), grants))
    }
}

/// Gate an ACL about to be stored on a bucket or one of its objects.
pub(crate) fn check_acl_write(
    snapshot: &BucketSnapshot,
    acl: &AccessControlList,
) -> AccessResult<()> {
    PublicAccessBlockGate::new(snapshot.public_access_block.as_ref())
        .check_acl_write(&acl.grants)?;

    if snapshot.acls_disabled() && !is_bucket_owner_only(acl, &snapshot.owner) {
        if acl.has_public_grants() {
            return Err(AccessError::AccessDenied);
        }
        return Err(AccessError::AccessControlListNotSupported);
    }
    Ok(())
}

/// Whether the ACL grants nothing beyond full control to the bucket owner.
///
/// These are the only ACLs accepted once ACLs are disabled.
fn is_bucket_owner_only(acl: &AccessControlList, bucket_owner: &Owner) -> bool {
    acl.grants.iter().all(|grant| {
        grant.permission == Permission::FullControl
            && matches!(&grant.grantee, Grantee::CanonicalUser { id, .. } if *id == bucket_owner.id)
    })
}
