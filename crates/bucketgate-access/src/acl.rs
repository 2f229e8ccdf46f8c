//! Access control lists and their evaluation.
//!
//! An [`AccessControlList`] pairs a resource owner with an ordered list of
//! [`Grant`]s. Evaluation is a pure function of the list, a [`Principal`] and
//! the [`Permission`] an operation needs: the owner is always allowed, other
//! callers are allowed when some grant names them (directly or through a
//! group) with the permission or with `FULL_CONTROL`.

use std::fmt;
use std::str::FromStr;

use bucketgate_auth::Principal;
use bucketgate_core::{CanonicalUserId, Owner};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, AccessResult};

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// A permission that can be granted to a grantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Grants READ, WRITE, READ_ACP and WRITE_ACP.
    FullControl,
    /// List the bucket or read the object data.
    Read,
    /// Create, overwrite or delete objects in the bucket.
    Write,
    /// Read the ACL.
    ReadAcp,
    /// Write the ACL.
    WriteAcp,
}

impl Permission {
    /// Whether holding `self` satisfies a requirement for `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self == Self::FullControl || self == required
    }

    /// The wire name of the permission.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullControl => "FULL_CONTROL",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_CONTROL" => Ok(Self::FullControl),
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "READ_ACP" => Ok(Self::ReadAcp),
            "WRITE_ACP" => Ok(Self::WriteAcp),
            other => Err(AccessError::malformed_xml(format!(
                "unknown permission {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Grantee / Grant
// ---------------------------------------------------------------------------

/// A predefined Amazon S3 group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Everyone, including anonymous callers.
    #[serde(rename = "http://acs.amazonaws.com/groups/global/AllUsers")]
    AllUsers,
    /// Any caller presenting valid credentials.
    #[serde(rename = "http://acs.amazonaws.com/groups/global/AuthenticatedUsers")]
    AuthenticatedUsers,
    /// The server access log delivery group.
    #[serde(rename = "http://acs.amazonaws.com/groups/s3/LogDelivery")]
    LogDelivery,
}

impl Group {
    /// The URI identifying the group.
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            Self::AllUsers => "http://acs.amazonaws.com/groups/global/AllUsers",
            Self::AuthenticatedUsers => "http://acs.amazonaws.com/groups/global/AuthenticatedUsers",
            Self::LogDelivery => "http://acs.amazonaws.com/groups/s3/LogDelivery",
        }
    }

    /// Look up a group by URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        [Self::AllUsers, Self::AuthenticatedUsers, Self::LogDelivery]
            .into_iter()
            .find(|group| group.uri() == uri)
    }

    /// Whether membership of this group makes a grant public.
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::AllUsers | Self::AuthenticatedUsers)
    }

    fn contains(self, principal: &Principal) -> bool {
        match self {
            Self::AllUsers => true,
            Self::AuthenticatedUsers => !principal.is_anonymous(),
            Self::LogDelivery => false,
        }
    }
}

/// A grantee in an ACL grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Grantee {
    /// A canonical user.
    CanonicalUser {
        /// The canonical user ID.
        id: CanonicalUserId,
        /// The display name for the user.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// A predefined group.
    Group {
        /// The group URI.
        uri: Group,
    },
    /// A grantee identified by email. Resolved to a canonical user before
    /// the ACL is stored.
    Email {
        /// The email address of the grantee.
        address: String,
    },
}

impl Grantee {
    /// A canonical-user grantee for an owner.
    #[must_use]
    pub fn user(owner: &Owner) -> Self {
        Self::CanonicalUser {
            id: owner.id.clone(),
            display_name: Some(owner.display_name.clone()),
        }
    }

    /// Whether the grantee is `AllUsers` or `AuthenticatedUsers`.
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Group { uri } if uri.is_public())
    }

    fn matches(&self, principal: &Principal) -> bool {
        match self {
            Self::CanonicalUser { id, .. } => principal.id() == Some(id),
            Self::Group { uri } => uri.contains(principal),
            Self::Email { .. } => false,
        }
    }
}

/// An ACL grant that pairs a grantee with a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// The entity receiving the permission.
    pub grantee: Grantee,
    /// The permission granted.
    pub permission: Permission,
}

impl Grant {
    /// Create a new grant.
    #[must_use]
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self {
            grantee,
            permission,
        }
    }

    /// Whether the grant opens the resource to `AllUsers` or `AuthenticatedUsers`.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.grantee.is_public()
    }
}

// ---------------------------------------------------------------------------
// AccessControlList
// ---------------------------------------------------------------------------

/// Outcome of an ACL evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The principal holds the permission.
    Allow,
    /// The principal does not hold the permission.
    Deny,
}

impl Decision {
    /// Whether access is allowed.
    #[must_use]
    pub fn is_allow(self) -> bool {
        self == Self::Allow
    }
}

/// An access control list attached to a bucket or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlList {
    /// The resource owner. Implicitly holds `FULL_CONTROL`.
    pub owner: Owner,
    /// Grants in the order they were supplied.
    pub grants: Vec<Grant>,
}

impl AccessControlList {
    /// Create an ACL from an owner and grants.
    #[must_use]
    pub fn new(owner: Owner, grants: Vec<Grant>) -> Self {
        Self { owner, grants }
    }

    /// The default ACL: the owner holds `FULL_CONTROL` and nobody else has access.
    #[must_use]
    pub fn private(owner: Owner) -> Self {
        let grant = Grant::new(Grantee::user(&owner), Permission::FullControl);
        Self::new(owner, vec![grant])
    }

    /// Evaluate whether `principal` holds `permission`.
    #[must_use]
    pub fn evaluate(&self, principal: &Principal, permission: Permission) -> Decision {
        self.evaluate_with(principal, permission, false)
    }

    /// Evaluate whether `principal` holds `permission`, optionally skipping
    /// grants to public groups (`IgnorePublicAcls`).
    #[must_use]
    pub fn evaluate_with(
        &self,
        principal: &Principal,
        permission: Permission,
        ignore_public: bool,
    ) -> Decision {
        if principal.is_owner() || principal.id() == Some(&self.owner.id) {
            return Decision::Allow;
        }

        let granted = self
            .grants
            .iter()
            .filter(|grant| !(ignore_public && grant.is_public()))
            .any(|grant| {
                grant.permission.satisfies(permission) && grant.grantee.matches(principal)
            });

        if granted {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Whether any grant opens the resource to `AllUsers` or `AuthenticatedUsers`.
    #[must_use]
    pub fn has_public_grants(&self) -> bool {
        self.grants.iter().any(Grant::is_public)
    }
}

// ---------------------------------------------------------------------------
// Grant headers
// ---------------------------------------------------------------------------

/// Request headers carrying explicit grants, paired with the permission they grant.
pub const GRANT_HEADERS: [(&str, Permission); 5] = [
    ("x-amz-grant-full-control", Permission::FullControl),
    ("x-amz-grant-read", Permission::Read),
    ("x-amz-grant-read-acp", Permission::ReadAcp),
    ("x-amz-grant-write", Permission::Write),
    ("x-amz-grant-write-acp", Permission::WriteAcp),
];

/// Collect explicit grants from `x-amz-grant-*` headers.
///
/// Returns `Ok(None)` when no grant header is present.
///
/// # Errors
///
/// Returns [`AccessError::InvalidArgument`] if a header value is malformed.
pub fn grants_from_headers(headers: &http::HeaderMap) -> AccessResult<Option<Vec<Grant>>> {
    let mut grants = Vec::new();
    let mut present = false;

    for (name, permission) in GRANT_HEADERS {
        for value in headers.get_all(name) {
            present = true;
            let value = value
                .to_str()
                .map_err(|_| AccessError::invalid_argument(format!("{name} is not valid text")))?;
            grants.extend(parse_grant_header(value, permission)?);
        }
    }

    Ok(present.then_some(grants))
}

/// Parse one grant header value, e.g. `id="abc", uri="http://..."`.
///
/// # Errors
///
/// Returns [`AccessError::InvalidArgument`] for unknown grantee types, invalid
/// canonical IDs or unknown group URIs.
pub fn parse_grant_header(value: &str, permission: Permission) -> AccessResult<Vec<Grant>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kind, raw) = entry
                .split_once('=')
                .ok_or_else(|| AccessError::invalid_argument(format!("malformed grant {entry}")))?;
            let raw = raw.trim().trim_matches('"');

            let grantee = match kind.trim().to_ascii_lowercase().as_str() {
                "id" => Grantee::CanonicalUser {
                    id: CanonicalUserId::new(raw)
                        .map_err(|e| AccessError::invalid_argument(e.to_string()))?,
                    display_name: None,
                },
                "uri" => Grantee::Group {
                    uri: Group::from_uri(raw).ok_or_else(|| {
                        AccessError::invalid_argument(format!("unknown group {raw}"))
                    })?,
                },
                "emailaddress" => Grantee::Email {
                    address: raw.to_owned(),
                },
                other => {
                    return Err(AccessError::invalid_argument(format!(
                        "unknown grantee type {other}"
                    )));
                }
            };

            Ok(Grant::new(grantee, permission))
        })
        .collect()
}
