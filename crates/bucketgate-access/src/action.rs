//! S3 operations and the access each one requires.
//!
//! Every operation has a policy action name (what a bucket policy statement
//! matches against) and an ACL requirement (which resource's ACL is
//! consulted, for which permission). Configuration operations are not
//! governed by ACLs at all and fall back to bucket ownership.

use std::fmt;

use crate::acl::Permission;

/// The resource whose ACL governs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclRequirement {
    /// The bucket ACL must grant the permission.
    Bucket(Permission),
    /// The object ACL must grant the permission.
    Object(Permission),
    /// Only the bucket owner may perform the operation (absent a policy grant).
    BucketOwner,
}

/// S3 operations understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum S3Action {
    // Bucket
    CreateBucket,
    DeleteBucket,
    HeadBucket,
    ListObjects,
    ListObjectVersions,
    GetBucketAcl,
    PutBucketAcl,

    // Object
    PutObject,
    GetObject,
    HeadObject,
    DeleteObject,
    GetObjectAcl,
    PutObjectAcl,
    GetObjectTagging,
    PutObjectTagging,
    DeleteObjectTagging,

    // Bucket configuration
    GetBucketPolicy,
    PutBucketPolicy,
    DeleteBucketPolicy,
    GetBucketPolicyStatus,
    GetPublicAccessBlock,
    PutPublicAccessBlock,
    DeletePublicAccessBlock,
    GetBucketCors,
    PutBucketCors,
    DeleteBucketCors,
    GetBucketOwnershipControls,
    PutBucketOwnershipControls,
    DeleteBucketOwnershipControls,
}

impl S3Action {
    /// The action name matched by bucket policy statements.
    #[must_use]
    pub fn policy_action(self) -> &'static str {
        match self {
            Self::CreateBucket => "s3:CreateBucket",
            Self::DeleteBucket => "s3:DeleteBucket",
            Self::HeadBucket | Self::ListObjects => "s3:ListBucket",
            Self::ListObjectVersions => "s3:ListBucketVersions",
            Self::GetBucketAcl => "s3:GetBucketAcl",
            Self::PutBucketAcl => "s3:PutBucketAcl",
            Self::PutObject => "s3:PutObject",
            Self::GetObject | Self::HeadObject => "s3:GetObject",
            Self::DeleteObject => "s3:DeleteObject",
            Self::GetObjectAcl => "s3:GetObjectAcl",
            Self::PutObjectAcl => "s3:PutObjectAcl",
            Self::GetObjectTagging => "s3:GetObjectTagging",
            Self::PutObjectTagging => "s3:PutObjectTagging",
            Self::DeleteObjectTagging => "s3:DeleteObjectTagging",
            Self::GetBucketPolicy => "s3:GetBucketPolicy",
            Self::PutBucketPolicy => "s3:PutBucketPolicy",
            Self::DeleteBucketPolicy => "s3:DeleteBucketPolicy",
            Self::GetBucketPolicyStatus => "s3:GetBucketPolicyStatus",
            Self::GetPublicAccessBlock => "s3:GetBucketPublicAccessBlock",
            Self::PutPublicAccessBlock | Self::DeletePublicAccessBlock => {
                "s3:PutBucketPublicAccessBlock"
            }
            Self::GetBucketCors => "s3:GetBucketCORS",
            Self::PutBucketCors | Self::DeleteBucketCors => "s3:PutBucketCORS",
            Self::GetBucketOwnershipControls => "s3:GetBucketOwnershipControls",
            Self::PutBucketOwnershipControls | Self::DeleteBucketOwnershipControls => {
                "s3:PutBucketOwnershipControls"
            }
        }
    }

    /// The ACL check backing the operation.
    #[must_use]
    pub fn requirement(self) -> AclRequirement {
        match self {
            Self::HeadBucket | Self::ListObjects | Self::ListObjectVersions => {
                AclRequirement::Bucket(Permission::Read)
            }
            Self::GetBucketAcl => AclRequirement::Bucket(Permission::ReadAcp),
            Self::PutBucketAcl => AclRequirement::Bucket(Permission::WriteAcp),
            Self::PutObject | Self::DeleteObject => AclRequirement::Bucket(Permission::Write),
            Self::GetObject | Self::HeadObject | Self::GetObjectTagging => {
                AclRequirement::Object(Permission::Read)
            }
            Self::GetObjectAcl => AclRequirement::Object(Permission::ReadAcp),
            Self::PutObjectAcl => AclRequirement::Object(Permission::WriteAcp),
            Self::PutObjectTagging | Self::DeleteObjectTagging => {
                AclRequirement::Object(Permission::Write)
            }
            Self::CreateBucket
            | Self::DeleteBucket
            | Self::GetBucketPolicy
            | Self::PutBucketPolicy
            | Self::DeleteBucketPolicy
            | Self::GetBucketPolicyStatus
            | Self::GetPublicAccessBlock
            | Self::PutPublicAccessBlock
            | Self::DeletePublicAccessBlock
            | Self::GetBucketCors
            | Self::PutBucketCors
            | Self::DeleteBucketCors
            | Self::GetBucketOwnershipControls
            | Self::PutBucketOwnershipControls
            | Self::DeleteBucketOwnershipControls => AclRequirement::BucketOwner,
        }
    }

    /// Whether the operation targets an object rather than the bucket.
    #[must_use]
    pub fn is_object_operation(self) -> bool {
        matches!(self.requirement(), AclRequirement::Object(_))
            || matches!(self, Self::PutObject | Self::DeleteObject)
    }
}

impl fmt::Display for S3Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
