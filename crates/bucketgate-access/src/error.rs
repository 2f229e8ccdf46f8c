//! Access-control error types.
//!
//! Defines [`AccessError`], covering every S3 error code the engine may
//! produce. Each variant maps to a wire error code via [`AccessError::code`]
//! and to an HTTP status via [`AccessError::status_code`].
//!
//! # Usage
//!
//! ```
//! use bucketgate_access::error::AccessError;
//!
//! let err = AccessError::NoSuchBucket {
//!     bucket: "my-bucket".to_owned(),
//! };
//! assert_eq!(err.code(), "NoSuchBucket");
//! assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
//! ```

use bucketgate_auth::AuthError;
use http::StatusCode;

/// Access-control error type.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    // -----------------------------------------------------------------------
    // Authorization errors
    // -----------------------------------------------------------------------
    /// Access denied.
    #[error("Access Denied")]
    AccessDenied,

    /// The pre-signed URL is expired or its query parameters are invalid.
    #[error("Query-string authentication failed: {message}")]
    AuthorizationQueryParametersError {
        /// Description of the failure.
        message: String,
    },

    /// The access key ID in the request is unknown.
    #[error("The AWS access key ID you provided does not exist in our records: {access_key_id}")]
    InvalidAccessKeyId {
        /// The unknown access key ID.
        access_key_id: String,
    },

    /// The credentials in the request could not be parsed.
    #[error("Authorization header is malformed: {message}")]
    AuthorizationHeaderMalformed {
        /// Description of the failure.
        message: String,
    },

    /// A CORS preflight request was rejected.
    #[error("CORSResponse: This CORS request is not allowed")]
    CorsForbidden,

    // -----------------------------------------------------------------------
    // Resource errors
    // -----------------------------------------------------------------------
    /// The specified bucket does not exist.
    #[error("The specified bucket does not exist: {bucket}")]
    NoSuchBucket {
        /// The bucket name that was not found.
        bucket: String,
    },

    /// The specified key does not exist.
    #[error("The specified key does not exist: {key}")]
    NoSuchKey {
        /// The key that was not found.
        key: String,
    },

    /// The requested bucket name is owned by another user.
    #[error("The requested bucket name is not available: {bucket}")]
    BucketAlreadyExists {
        /// The bucket name that already exists.
        bucket: String,
    },

    /// The bucket already exists and is owned by the caller.
    #[error(
        "Your previous request to create the named bucket succeeded and you already own it: {bucket}"
    )]
    BucketAlreadyOwnedByYou {
        /// The bucket name that already exists.
        bucket: String,
    },

    // -----------------------------------------------------------------------
    // Configuration-not-found errors
    // -----------------------------------------------------------------------
    /// The public access block configuration does not exist.
    #[error("The public access block configuration was not found")]
    NoSuchPublicAccessBlockConfiguration,

    /// The bucket policy does not exist.
    #[error("The bucket policy does not exist")]
    NoSuchBucketPolicy,

    /// The CORS configuration does not exist.
    #[error("The CORS configuration does not exist")]
    NoSuchCorsConfiguration,

    /// The ownership controls configuration does not exist.
    #[error("The bucket ownership controls were not found")]
    OwnershipControlsNotFoundError,

    // -----------------------------------------------------------------------
    // Validation errors
    // -----------------------------------------------------------------------
    /// The XML body (or its parsed equivalent) is malformed.
    #[error("The XML you provided was not well-formed or did not validate: {message}")]
    MalformedXml {
        /// Description of the problem.
        message: String,
    },

    /// The policy document is malformed.
    #[error("Policy has invalid syntax: {message}")]
    MalformedPolicy {
        /// Description of the problem.
        message: String,
    },

    /// An argument provided is invalid.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The request is invalid for the current configuration.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// The bucket does not allow ACLs.
    #[error("The bucket does not allow ACLs")]
    AccessControlListNotSupported,

    /// The request is missing required information.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Internal / catch-all
    // -----------------------------------------------------------------------
    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccessError {
    /// The S3 error code string for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccessDenied | Self::CorsForbidden => "AccessDenied",
            Self::AuthorizationQueryParametersError { .. } => "AuthorizationQueryParametersError",
            Self::InvalidAccessKeyId { .. } => "InvalidAccessKeyId",
            Self::AuthorizationHeaderMalformed { .. } => "AuthorizationHeaderMalformed",
            Self::NoSuchBucket { .. } => "NoSuchBucket",
            Self::NoSuchKey { .. } => "NoSuchKey",
            Self::BucketAlreadyExists { .. } => "BucketAlreadyExists",
            Self::BucketAlreadyOwnedByYou { .. } => "BucketAlreadyOwnedByYou",
            Self::NoSuchPublicAccessBlockConfiguration => "NoSuchPublicAccessBlockConfiguration",
            Self::NoSuchBucketPolicy => "NoSuchBucketPolicy",
            Self::NoSuchCorsConfiguration => "NoSuchCORSConfiguration",
            Self::OwnershipControlsNotFoundError => "OwnershipControlsNotFoundError",
            Self::MalformedXml { .. } => "MalformedXML",
            Self::MalformedPolicy { .. } => "MalformedPolicy",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::AccessControlListNotSupported => "AccessControlListNotSupported",
            Self::BadRequest { .. } => "BadRequest",
            Self::Internal(_) => "InternalError",
        }
    }

    /// The HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied
            | Self::CorsForbidden
            | Self::AuthorizationQueryParametersError { .. }
            | Self::InvalidAccessKeyId { .. } => StatusCode::FORBIDDEN,
            Self::NoSuchBucket { .. }
            | Self::NoSuchKey { .. }
            | Self::NoSuchPublicAccessBlockConfiguration
            | Self::NoSuchBucketPolicy
            | Self::NoSuchCorsConfiguration
            | Self::OwnershipControlsNotFoundError => StatusCode::NOT_FOUND,
            Self::BucketAlreadyExists { .. } | Self::BucketAlreadyOwnedByYou { .. } => {
                StatusCode::CONFLICT
            }
            Self::AuthorizationHeaderMalformed { .. }
            | Self::MalformedXml { .. }
            | Self::MalformedPolicy { .. }
            | Self::InvalidArgument { .. }
            | Self::InvalidRequest { .. }
            | Self::AccessControlListNotSupported
            | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is an authorization denial.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied | Self::CorsForbidden)
    }

    pub(crate) fn malformed_policy(message: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            message: message.into(),
        }
    }

    pub(crate) fn malformed_xml(message: impl Into<String>) -> Self {
        Self::MalformedXml {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

impl From<AuthError> for AccessError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccessKeyNotFound(access_key_id) => {
                Self::InvalidAccessKeyId { access_key_id }
            }
            err if err.is_query_parameter_error() => Self::AuthorizationQueryParametersError {
                message: err.to_string(),
            },
            err => Self::AuthorizationHeaderMalformed {
                message: err.to_string(),
            },
        }
    }
}

/// Convenience result type for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;
