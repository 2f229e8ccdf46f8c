//! AWS Signature Version 4 `Authorization` header parsing.
//!
//! Only the components needed to identify the caller are extracted; the
//! signature itself is verified upstream.

use crate::error::AuthError;

/// The only SigV4 algorithm accepted.
pub const SUPPORTED_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Credential scope carried by a SigV4 header or pre-signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The AWS region from the credential scope.
    pub region: String,
    /// The AWS service from the credential scope.
    pub service: String,
}

impl CredentialScope {
    /// Parse a credential string (`AKID/date/region/service/aws4_request`).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] if the string has the wrong shape.
    pub fn parse(credential: &str) -> Result<Self, AuthError> {
        let parts: Vec<&str> = credential.splitn(5, '/').collect();
        if parts.len() != 5 || parts[4] != "aws4_request" || parts[0].is_empty() {
            return Err(AuthError::InvalidCredential);
        }
        Ok(Self {
            access_key_id: parts[0].to_owned(),
            date: parts[1].to_owned(),
            region: parts[2].to_owned(),
            service: parts[3].to_owned(),
        })
    }
}

/// Whether the header value uses the SigV4 scheme.
#[must_use]
pub fn is_sigv4(auth_header: &str) -> bool {
    auth_header.starts_with("AWS4-")
}

/// Parse an AWS SigV4 `Authorization` header value into its credential scope.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256 Credential=AKID/20130524/us-east-1/s3/aws4_request,
///   SignedHeaders=host;x-amz-content-sha256;x-amz-date,
///   Signature=<hex-signature>
/// ```
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the header format is invalid,
/// or [`AuthError::UnsupportedAlgorithm`] if the algorithm is not `AWS4-HMAC-SHA256`.
pub fn parse_authorization_header(header: &str) -> Result<CredentialScope, AuthError> {
    let (algorithm, rest) = header.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;

    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let mut credential = None;
    let mut has_signature = false;

    for part in rest.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("Credential=") {
            credential = Some(value);
        } else if part.starts_with("Signature=") {
            has_signature = true;
        }
    }

    if !has_signature {
        return Err(AuthError::InvalidAuthHeader);
    }
    CredentialScope::parse(credential.ok_or(AuthError::InvalidAuthHeader)?)
}
