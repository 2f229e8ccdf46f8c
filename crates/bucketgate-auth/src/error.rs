//! Error types for caller identification.
//!
//! All failures are represented by [`AuthError`]. The access-control engine
//! maps them onto S3 error codes; see [`AuthError::is_query_parameter_error`].

/// Errors that can occur while identifying the caller of a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `Credential` component does not match the expected format
    /// (`AKID/date/region/service/aws4_request`).
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key ID was not found in the credential store.
    #[error("Access key not found: {0}")]
    AccessKeyNotFound(String),

    /// The pre-signed URL has expired.
    #[error("Request has expired")]
    RequestExpired,

    /// A required query parameter for pre-signed URL authentication is missing.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// A pre-signed URL query parameter has an invalid value.
    #[error("Invalid query parameter {name}: {reason}")]
    InvalidQueryParam {
        /// The name of the parameter.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl AuthError {
    /// Whether this error concerns pre-signed URL query parameters
    /// (surfaced as `AuthorizationQueryParametersError`).
    #[must_use]
    pub fn is_query_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::RequestExpired | Self::MissingQueryParam(_) | Self::InvalidQueryParam { .. }
        )
    }
}
