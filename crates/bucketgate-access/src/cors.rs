//! CORS rule matching and response header generation.
//!
//! A [`CorsConfiguration`] is validated and compiled into a [`CorsMatcher`]
//! when it is written. Matching walks the rules in configured order and the
//! first rule whose origin, method and (for preflight) headers all match
//! wins. Origin patterns carry at most one `*` and are compiled into an
//! [`OriginPattern`] so matching is a pair of prefix/suffix checks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AccessError, AccessResult};
use crate::policy::wildcard;

/// Methods a CORS rule may allow.
pub const ALLOWED_METHODS: [&str; 5] = ["GET", "PUT", "POST", "DELETE", "HEAD"];

// ---------------------------------------------------------------------------
// CorsRule / CorsConfiguration
// ---------------------------------------------------------------------------

/// A single CORS rule as written by the bucket owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsRule {
    /// Optional identifier for the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Origin patterns, each with at most one `*`.
    pub allowed_origins: Vec<String>,
    /// HTTP methods the origin may use.
    pub allowed_methods: Vec<String>,
    /// Request headers allowed in a preflight (supports `*`).
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// Response headers the browser may read.
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// How long the browser may cache the preflight result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<i32>,
}

/// An ordered list of CORS rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsConfiguration {
    /// Rules in evaluation order.
    pub rules: Vec<CorsRule>,
}

impl CorsConfiguration {
    /// Create a configuration from rules.
    #[must_use]
    pub fn new(rules: Vec<CorsRule>) -> Self {
        Self { rules }
    }

    /// Validate and compile the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedXml`] for an empty rule list, too many
    /// rules, a rule without origins or methods, or a negative max age, and
    /// [`AccessError::InvalidRequest`] for unsupported methods or patterns
    /// with more than one wildcard.
    pub fn compile(self, max_rules: usize) -> AccessResult<CorsMatcher> {
        if self.rules.is_empty() {
            return Err(AccessError::malformed_xml(
                "CORS configuration must contain at least one rule",
            ));
        }
        if self.rules.len() > max_rules {
            return Err(AccessError::malformed_xml(format!(
                "CORS configuration may contain at most {max_rules} rules"
            )));
        }

        let mut compiled = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if rule.allowed_origins.is_empty() || rule.allowed_methods.is_empty() {
                return Err(AccessError::malformed_xml(
                    "CORS rule must have at least one AllowedOrigin and one AllowedMethod",
                ));
            }
            if let Some(method) = rule
                .allowed_methods
                .iter()
                .find(|m| !ALLOWED_METHODS.contains(&m.as_str()))
            {
                return Err(AccessError::InvalidRequest {
                    message: format!(
                        "Found unsupported HTTP method in CORS config. Unsupported method is {method}"
                    ),
                });
            }
            if let Some(header) = rule
                .allowed_headers
                .iter()
                .find(|h| h.matches('*').count() > 1)
            {
                return Err(AccessError::InvalidRequest {
                    message: format!(
                        "AllowedHeader \"{header}\" can not have more than one wildcard"
                    ),
                });
            }
            if rule.max_age_seconds.is_some_and(|age| age < 0) {
                return Err(AccessError::malformed_xml(
                    "MaxAgeSeconds must not be negative",
                ));
            }
            let origins = rule
                .allowed_origins
                .iter()
                .map(|o| OriginPattern::parse(o))
                .collect::<AccessResult<Vec<_>>>()?;
            compiled.push(origins);
        }

        Ok(CorsMatcher {
            config: self,
            origins: compiled,
        })
    }
}

// ---------------------------------------------------------------------------
// OriginPattern
// ---------------------------------------------------------------------------

/// A compiled `AllowedOrigin` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// `*`: any origin.
    Any,
    /// No wildcard: the origin must be equal.
    Exact(String),
    /// `prefix*`
    Prefix(String),
    /// `*suffix`
    Suffix(String),
    /// `start*end`: the middle may be empty.
    Infix {
        /// Text before the wildcard.
        start: String,
        /// Text after the wildcard.
        end: String,
    },
}

impl OriginPattern {
    /// Compile an origin pattern.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidRequest`] when the pattern has more
    /// than one `*`.
    pub fn parse(pattern: &str) -> AccessResult<Self> {
        let Some((start, end)) = pattern.split_once('*') else {
            return Ok(Self::Exact(pattern.to_owned()));
        };
        if end.contains('*') {
            return Err(AccessError::InvalidRequest {
                message: format!("AllowedOrigin \"{pattern}\" can not have more than one wildcard"),
            });
        }

        Ok(match (start.is_empty(), end.is_empty()) {
            (true, true) => Self::Any,
            (true, false) => Self::Suffix(end.to_owned()),
            (false, true) => Self::Prefix(start.to_owned()),
            (false, false) => Self::Infix {
                start: start.to_owned(),
                end: end.to_owned(),
            },
        })
    }

    /// Whether `origin` matches the pattern.
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => exact == origin,
            Self::Prefix(prefix) => origin.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => origin.ends_with(suffix.as_str()),
            Self::Infix { start, end } => {
                origin.len() >= start.len() + end.len()
                    && origin.starts_with(start.as_str())
                    && origin.ends_with(end.as_str())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CorsMatcher
// ---------------------------------------------------------------------------

/// A validated CORS configuration with compiled origin patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsMatcher {
    config: CorsConfiguration,
    origins: Vec<Vec<OriginPattern>>,
}

/// The response header directives of a matched CORS request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    /// `Access-Control-Allow-Origin`: the request origin, or `*` for a
    /// wildcard-all rule.
    pub allow_origin: String,
    /// `Access-Control-Allow-Methods`.
    pub allow_methods: Vec<String>,
    /// `Access-Control-Allow-Headers`: the requested headers on preflight.
    pub allow_headers: Vec<String>,
    /// `Access-Control-Expose-Headers`.
    pub expose_headers: Vec<String>,
    /// `Access-Control-Max-Age`.
    pub max_age_seconds: Option<i32>,
    /// `Access-Control-Allow-Credentials`, set unless the origin is `*`.
    pub allow_credentials: bool,
}

impl CorsHeaders {
    /// Render the directives as HTTP headers, including `Vary: Origin`.
    #[must_use]
    pub fn to_header_map(&self) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        let mut set = |name: http::HeaderName, value: &str| {
            if let Ok(value) = http::HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        };

        set(http::header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origin);
        if !self.allow_methods.is_empty() {
            set(
                http::header::ACCESS_CONTROL_ALLOW_METHODS,
                &self.allow_methods.join(", "),
            );
        }
        if !self.allow_headers.is_empty() {
            set(
                http::header::ACCESS_CONTROL_ALLOW_HEADERS,
                &self.allow_headers.join(", "),
            );
        }
        if !self.expose_headers.is_empty() {
            set(
                http::header::ACCESS_CONTROL_EXPOSE_HEADERS,
                &self.expose_headers.join(", "),
            );
        }
        if let Some(age) = self.max_age_seconds {
            set(http::header::ACCESS_CONTROL_MAX_AGE, &age.to_string());
        }
        if self.allow_credentials {
            set(http::header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
        }
        set(http::header::VARY, "Origin");

        headers
    }
}

impl CorsMatcher {
    /// The configuration as it was written.
    #[must_use]
    pub fn configuration(&self) -> &CorsConfiguration {
        &self.config
    }

    /// Evaluate a preflight (`OPTIONS`) request.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::BadRequest`] when `origin` is missing and
    /// [`AccessError::CorsForbidden`] when the request method is missing or
    /// no rule allows the origin, method and requested headers.
    pub fn evaluate_preflight(
        matcher: Option<&Self>,
        origin: Option<&str>,
        request_method: Option<&str>,
        request_headers: &[String],
    ) -> AccessResult<CorsHeaders> {
        let Some(origin) = origin else {
            return Err(AccessError::BadRequest {
                message: "Insufficient information. Origin request header needed.".to_owned(),
            });
        };
        let (Some(matcher), Some(method)) = (matcher, request_method) else {
            return Err(AccessError::CorsForbidden);
        };

        let hit = matcher.find(origin, method, |rule| {
            headers_allowed(&rule.allowed_headers, request_headers)
        });
        match hit {
            Some((rule, pattern)) => {
                debug!(origin, method, rule_id = ?rule.id, "cors_preflight_matched");
                let mut headers = Self::directives(rule, pattern, origin);
                headers.allow_headers = request_headers.to_vec();
                Ok(headers)
            }
            None => {
                debug!(origin, method, "cors_preflight_rejected");
                Err(AccessError::CorsForbidden)
            }
        }
    }

    /// Evaluate an actual cross-origin request.
    ///
    /// Returns `None` when there is no origin or no matching rule; the
    /// request itself proceeds either way.
    #[must_use]
    pub fn evaluate_actual(
        matcher: Option<&Self>,
        origin: Option<&str>,
        method: &str,
    ) -> Option<CorsHeaders> {
        let (matcher, origin) = (matcher?, origin?);
        let (rule, pattern) = matcher.find(origin, method, |_| true)?;
        let mut headers = Self::directives(rule, pattern, origin);
        headers.max_age_seconds = None;
        Some(headers)
    }

    fn find(
        &self,
        origin: &str,
        method: &str,
        extra: impl Fn(&CorsRule) -> bool,
    ) -> Option<(&CorsRule, &OriginPattern)> {
        self.config
            .rules
            .iter()
            .zip(&self.origins)
            .filter(|(rule, _)| rule.allowed_methods.iter().any(|m| m == method))
            .filter(|(rule, _)| extra(*rule))
            .find_map(|(rule, patterns)| {
                patterns
                    .iter()
                    .find(|p| p.matches(origin))
                    .map(|pattern| (rule, pattern))
            })
    }

    fn directives(rule: &CorsRule, pattern: &OriginPattern, origin: &str) -> CorsHeaders {
        let wildcard = *pattern == OriginPattern::Any;
        CorsHeaders {
            allow_origin: if wildcard { "*".to_owned() } else { origin.to_owned() },
            allow_methods: rule.allowed_methods.clone(),
            allow_headers: Vec::new(),
            expose_headers: rule.expose_headers.clone(),
            max_age_seconds: rule.max_age_seconds,
            allow_credentials: !wildcard,
        }
    }
}

/// Whether every requested header is covered by the rule's `AllowedHeader`s.
fn headers_allowed(allowed: &[String], requested: &[String]) -> bool {
    requested.iter().all(|req| {
        allowed
            .iter()
            .any(|pattern| wildcard::is_match_ignore_case(pattern, req.trim()))
    })
}
