//! AWS Signature Version 2 `Authorization` header parsing.
//!
//! ```text
//! AWS <AWSAccessKeyId>:<Signature>
//! ```

use crate::error::AuthError;

/// Check whether the `Authorization` header uses SigV2 format (`AWS AKID:sig`).
#[must_use]
pub fn is_sigv2(auth_header: &str) -> bool {
    auth_header.starts_with("AWS ") && !auth_header.starts_with("AWS4-")
}

/// Extract the access key ID from a SigV2 `Authorization` header.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the header is not of the form
/// `AWS AKID:signature`.
pub fn parse_sigv2_header(header: &str) -> Result<String, AuthError> {
    let rest = header
        .strip_prefix("AWS ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let (access_key_id, signature) = rest.split_once(':').ok_or(AuthError::InvalidAuthHeader)?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(access_key_id.to_owned())
}
