//! Principal resolution.
//!
//! A request is first *identified*: its credentials (an `Authorization`
//! header or pre-signed query parameters) are mapped to a canonical user, or
//! to nobody. The identity is then *resolved* against each resource it
//! touches, yielding a [`Principal`] that knows whether the caller owns that
//! resource.

use std::fmt;
use std::sync::Arc;

use bucketgate_core::{CanonicalUserId, Owner};
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::presigned::{MAX_EXPIRES_SECONDS, PresignedUrlGrant, parse_presigned_query};
use crate::{sigv2, sigv4};

/// The requester as seen from one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// No credentials were presented.
    Anonymous,
    /// Valid credentials that do not own the resource.
    Authenticated {
        /// Canonical user ID of the caller.
        id: CanonicalUserId,
    },
    /// Valid credentials of the resource owner.
    Owner {
        /// Canonical user ID of the caller.
        id: CanonicalUserId,
    },
}

impl Principal {
    /// Resolve a caller against the owner of a resource.
    #[must_use]
    pub fn resolve(caller: Option<&CanonicalUserId>, resource_owner: &CanonicalUserId) -> Self {
        match caller {
            None => Self::Anonymous,
            Some(id) if id == resource_owner => Self::Owner { id: id.clone() },
            Some(id) => Self::Authenticated { id: id.clone() },
        }
    }

    /// Canonical user ID of the caller, if any.
    #[must_use]
    pub fn id(&self) -> Option<&CanonicalUserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { id } | Self::Owner { id } => Some(id),
        }
    }

    /// Whether the caller presented no credentials.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Whether the caller owns the resource.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner { .. })
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Authenticated { id } => write!(f, "authenticated({id})"),
            Self::Owner { id } => write!(f, "owner({id})"),
        }
    }
}

/// Who is calling, and through which pre-signed URL if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    /// The authenticated caller, `None` for anonymous requests.
    pub caller: Option<Owner>,
    /// The pre-signed URL the request was made through.
    pub presigned: Option<PresignedUrlGrant>,
}

impl RequestIdentity {
    /// An anonymous identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An identity authenticated as `owner`.
    #[must_use]
    pub fn user(owner: Owner) -> Self {
        Self {
            caller: Some(owner),
            presigned: None,
        }
    }

    /// Canonical user ID of the caller, if any.
    #[must_use]
    pub fn caller_id(&self) -> Option<&CanonicalUserId> {
        self.caller.as_ref().map(|owner| &owner.id)
    }
}

/// Identifies callers from HTTP request parts.
pub struct PrincipalResolver {
    provider: Arc<dyn CredentialProvider>,
    max_presigned_expires: i64,
}

impl fmt::Debug for PrincipalResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalResolver")
            .field("max_presigned_expires", &self.max_presigned_expires)
            .finish_non_exhaustive()
    }
}

impl PrincipalResolver {
    /// Create a resolver backed by a credential provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            max_presigned_expires: MAX_EXPIRES_SECONDS,
        }
    }

    /// Override the longest pre-signed URL lifetime accepted.
    #[must_use]
    pub fn with_max_presigned_expires(mut self, seconds: i64) -> Self {
        self.max_presigned_expires = seconds;
        self
    }

    /// The credential provider backing this resolver.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn CredentialProvider> {
        &self.provider
    }

    /// Identify the caller of a request.
    ///
    /// The `Authorization` header takes precedence over pre-signed query
    /// parameters. A request carrying neither is anonymous. Expiry of a
    /// pre-signed URL is not checked here; see [`PresignedUrlGrant::validate`].
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the credentials are malformed or the
    /// access key ID is unknown.
    pub fn identify(&self, parts: &http::request::Parts) -> Result<RequestIdentity, AuthError> {
        if let Some(value) = parts.headers.get(http::header::AUTHORIZATION) {
            let header = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
            let access_key_id = if sigv4::is_sigv4(header) {
                sigv4::parse_authorization_header(header)?.access_key_id
            } else if sigv2::is_sigv2(header) {
                sigv2::parse_sigv2_header(header)?
            } else {
                let scheme = header.split_whitespace().next().unwrap_or_default();
                return Err(AuthError::UnsupportedAlgorithm(scheme.to_owned()));
            };

            let owner = self.provider.identify(&access_key_id)?;
            debug!(access_key_id = %access_key_id, caller = %owner, "identified caller from header");
            return Ok(RequestIdentity::user(owner));
        }

        let query = parts.uri.query().unwrap_or("");
        if let Some(grant) =
            parse_presigned_query(parts.uri.path(), query, self.max_presigned_expires)?
        {
            let owner = self.provider.identify(&grant.access_key_id)?;
            debug!(access_key_id = %grant.access_key_id, caller = %owner, "identified caller from pre-signed URL");
            return Ok(RequestIdentity {
                caller: Some(owner),
                presigned: Some(grant),
            });
        }

        Ok(RequestIdentity::anonymous())
    }
}
