//! Canned ACLs.
//!
//! A [`CannedAcl`] is a named template that expands into a deterministic
//! grant set. Object ACLs may reference the bucket owner
//! (`bucket-owner-read`, `bucket-owner-full-control`), so expansion takes the
//! bucket owner alongside the resource owner.

use std::fmt;
use std::str::FromStr;

use bucketgate_core::Owner;
use serde::{Deserialize, Serialize};

use crate::acl::{AccessControlList, Grant, Grantee, Group, Permission};
use crate::error::AccessError;

/// Predefined (canned) ACL grants for buckets and objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    /// Owner gets `FULL_CONTROL`. No one else has access rights.
    #[default]
    Private,
    /// Owner gets `FULL_CONTROL`. `AllUsers` gets `READ`.
    PublicRead,
    /// Owner gets `FULL_CONTROL`. `AllUsers` gets `READ` and `WRITE`.
    PublicReadWrite,
    /// Owner gets `FULL_CONTROL`. `AuthenticatedUsers` gets `READ`.
    AuthenticatedRead,
    /// Owner gets `FULL_CONTROL`. The EC2 read grant is not modelled.
    AwsExecRead,
    /// Object owner gets `FULL_CONTROL`. Bucket owner gets `READ`.
    BucketOwnerRead,
    /// Object owner and bucket owner both get `FULL_CONTROL`.
    BucketOwnerFullControl,
    /// Owner gets `FULL_CONTROL`. `LogDelivery` gets `WRITE` and `READ_ACP`.
    LogDeliveryWrite,
}

impl CannedAcl {
    /// Return the header value of the canned ACL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
            Self::AwsExecRead => "aws-exec-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
            Self::LogDeliveryWrite => "log-delivery-write",
        }
    }

    /// Whether the expanded grants open the resource to a public group.
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Self::PublicRead | Self::PublicReadWrite | Self::AuthenticatedRead
        )
    }

    /// Expand into grants for a resource owned by `owner`.
    ///
    /// `bucket_owner` is the owner of the enclosing bucket when expanding an
    /// object ACL; it is ignored when it equals `owner`.
    #[must_use]
    pub fn grants(&self, owner: &Owner, bucket_owner: Option<&Owner>) -> Vec<Grant> {
        let mut grants = vec![Grant::new(Grantee::user(owner), Permission::FullControl)];
        let group = |uri, permission| Grant::new(Grantee::Group { uri }, permission);
        let distinct_bucket_owner = bucket_owner.filter(|b| b.id != owner.id);

        match self {
            Self::Private | Self::AwsExecRead => {}
            Self::PublicRead => grants.push(group(Group::AllUsers, Permission::Read)),
            Self::PublicReadWrite => {
                grants.push(group(Group::AllUsers, Permission::Read));
                grants.push(group(Group::AllUsers, Permission::Write));
            }
            Self::AuthenticatedRead => {
                grants.push(group(Group::AuthenticatedUsers, Permission::Read));
            }
            Self::BucketOwnerRead => {
                if let Some(bucket_owner) = distinct_bucket_owner {
                    grants.push(Grant::new(Grantee::user(bucket_owner), Permission::Read));
                }
            }
            Self::BucketOwnerFullControl => {
                if let Some(bucket_owner) = distinct_bucket_owner {
                    grants.push(Grant::new(
                        Grantee::user(bucket_owner),
                        Permission::FullControl,
                    ));
                }
            }
            Self::LogDeliveryWrite => {
                grants.push(group(Group::LogDelivery, Permission::Write));
                grants.push(group(Group::LogDelivery, Permission::ReadAcp));
            }
        }

        grants
    }

    /// Expand into a complete ACL owned by `owner`.
    #[must_use]
    pub fn to_acl(&self, owner: &Owner, bucket_owner: Option<&Owner>) -> AccessControlList {
        AccessControlList::new(owner.clone(), self.grants(owner, bucket_owner))
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CannedAcl {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            "aws-exec-read" => Ok(Self::AwsExecRead),
            "bucket-owner-read" => Ok(Self::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(Self::BucketOwnerFullControl),
            "log-delivery-write" => Ok(Self::LogDeliveryWrite),
            other => Err(AccessError::invalid_argument(format!(
                "unknown canned ACL {other}"
            ))),
        }
    }
}
