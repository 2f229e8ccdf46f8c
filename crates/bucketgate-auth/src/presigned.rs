//! Pre-signed URL parsing and expiry validation.
//!
//! Pre-signed URLs carry their authentication in query parameters. Two
//! flavours are recognised:
//!
//! - SigV4: `X-Amz-Algorithm`, `X-Amz-Credential`, `X-Amz-Date` (ISO 8601
//!   basic format), `X-Amz-Expires` (seconds), `X-Amz-Signature`
//! - SigV2: `AWSAccessKeyId`, `Expires` (epoch seconds), `Signature`
//!
//! A URL is valid strictly before its expiry instant, so an expiry at the
//! epoch is already expired. A SigV4 lifetime outside `1..=max_expires`
//! seconds is rejected as an invalid query parameter.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::AuthError;
use crate::sigv4::{CredentialScope, SUPPORTED_ALGORITHM};

/// Longest lifetime a SigV4 pre-signed URL may request (seven days).
pub const MAX_EXPIRES_SECONDS: i64 = 604_800;

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Signature scheme used to pre-sign a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignStyle {
    /// `X-Amz-*` query parameters.
    V4,
    /// `AWSAccessKeyId` / `Expires` / `Signature` query parameters.
    V2,
}

/// A pre-signed URL grant: who signed it, for which resource, and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrlGrant {
    /// Request path the URL was issued for.
    pub resource: String,
    /// Access key ID of the signer.
    pub access_key_id: String,
    /// Signature scheme.
    pub style: PresignStyle,
    /// Signing time (SigV4 only).
    pub issued_at: Option<DateTime<Utc>>,
    /// First instant at which the URL is no longer valid.
    pub expires_at: DateTime<Utc>,
}

impl PresignedUrlGrant {
    /// Check this grant against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RequestExpired`] once `now` reaches `expires_at`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        validate_expiry(self.expires_at, now)
    }
}

/// Validate a pre-signed URL expiry instant.
///
/// # Errors
///
/// Returns [`AuthError::RequestExpired`] when `now >= expires_at`.
pub fn validate_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AuthError> {
    if now >= expires_at {
        debug!(%expires_at, %now, "pre-signed URL expired");
        return Err(AuthError::RequestExpired);
    }
    Ok(())
}

/// Whether the query string carries pre-signed URL parameters.
#[must_use]
pub fn is_presigned(query: &str) -> bool {
    query.split('&').any(|param| {
        let key = param.split_once('=').map_or(param, |(k, _)| k);
        key == "X-Amz-Algorithm" || key == "AWSAccessKeyId"
    })
}

/// Parse pre-signed URL parameters from a request path and query string.
///
/// Returns `Ok(None)` when the query carries no pre-signed parameters.
///
/// # Errors
///
/// Returns [`AuthError::MissingQueryParam`] if a required parameter is absent,
/// [`AuthError::InvalidQueryParam`] if a value is malformed or the requested
/// lifetime is not within `1..=max_expires`, or the errors of
/// [`CredentialScope::parse`].
pub fn parse_presigned_query(
    path: &str,
    query: &str,
    max_expires: i64,
) -> Result<Option<PresignedUrlGrant>, AuthError> {
    let params: HashMap<String, String> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((key.to_owned(), url_decode(value)))
        })
        .collect();

    let grant = if params.contains_key("X-Amz-Algorithm") {
        parse_v4(path, &params, max_expires)?
    } else if params.contains_key("AWSAccessKeyId") {
        parse_v2(path, &params)?
    } else {
        return Ok(None);
    };

    debug!(
        access_key_id = %grant.access_key_id,
        expires_at = %grant.expires_at,
        style = ?grant.style,
        "parsed pre-signed URL"
    );
    Ok(Some(grant))
}

fn parse_v4(
    path: &str,
    params: &HashMap<String, String>,
    max_expires: i64,
) -> Result<PresignedUrlGrant, AuthError> {
    let algorithm = get_required_param(params, "X-Amz-Algorithm")?;
    if algorithm != SUPPORTED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    let scope = CredentialScope::parse(get_required_param(params, "X-Amz-Credential")?)?;
    let timestamp = get_required_param(params, "X-Amz-Date")?;
    let expires = get_required_param(params, "X-Amz-Expires")?;
    get_required_param(params, "X-Amz-Signature")?;

    let issued_at = NaiveDateTime::parse_from_str(timestamp, AMZ_DATE_FORMAT)
        .map_err(|_| invalid("X-Amz-Date", "expected YYYYMMDDTHHMMSSZ"))?
        .and_utc();

    let lifetime: i64 = expires
        .parse()
        .map_err(|_| invalid("X-Amz-Expires", "not an integer"))?;
    if !(1..=max_expires).contains(&lifetime) {
        return Err(invalid(
            "X-Amz-Expires",
            &format!("must be between 1 and {max_expires} seconds"),
        ));
    }

    let expires_at = TimeDelta::try_seconds(lifetime)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| invalid("X-Amz-Expires", "out of range"))?;

    Ok(PresignedUrlGrant {
        resource: path.to_owned(),
        access_key_id: scope.access_key_id,
        style: PresignStyle::V4,
        issued_at: Some(issued_at),
        expires_at,
    })
}

fn parse_v2(path: &str, params: &HashMap<String, String>) -> Result<PresignedUrlGrant, AuthError> {
    let access_key_id = get_required_param(params, "AWSAccessKeyId")?;
    let expires = get_required_param(params, "Expires")?;
    get_required_param(params, "Signature")?;

    let epoch: i64 = expires
        .parse()
        .map_err(|_| invalid("Expires", "not an integer"))?;
    let expires_at =
        DateTime::from_timestamp(epoch, 0).ok_or_else(|| invalid("Expires", "out of range"))?;

    Ok(PresignedUrlGrant {
        resource: path.to_owned(),
        access_key_id: access_key_id.to_owned(),
        style: PresignStyle::V2,
        issued_at: None,
        expires_at,
    })
}

fn invalid(name: &str, reason: &str) -> AuthError {
    AuthError::InvalidQueryParam {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

fn url_decode(input: &str) -> String {
    percent_encoding::percent_decode_str(input)
        .decode_utf8_lossy()
        .into_owned()
}

fn get_required_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, AuthError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
}
