//! Policy condition operators and the request context they read.
//!
//! A condition block such as
//!
//! ```json
//! { "StringLike": { "s3:x-amz-acl": ["public*"] }, "IpAddress": { "aws:SourceIp": "10.0.0.0/8" } }
//! ```
//!
//! is compiled at policy write time into a list of [`Condition`]s, one per
//! operator and key. A statement applies only when every condition holds.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;
use serde_json::Value;

use super::wildcard;
use crate::error::{AccessError, AccessResult};

// ---------------------------------------------------------------------------
// ConditionContext
// ---------------------------------------------------------------------------

/// Condition keys and their values for one request.
///
/// Keys are case-insensitive, matching IAM semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionContext {
    values: BTreeMap<String, Vec<String>>,
}

impl ConditionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for a key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Values recorded for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Derive the condition keys carried by an HTTP request.
    ///
    /// Covers `aws:SourceIp`, `aws:SecureTransport`, `aws:Referer`,
    /// `aws:UserAgent`, the `s3:x-amz-*` request headers and the
    /// `prefix`/`delimiter`/`max-keys` list parameters.
    #[must_use]
    pub fn from_request_parts(parts: &http::request::Parts, source_ip: Option<IpAddr>) -> Self {
        let mut ctx = Self::new();

        if let Some(ip) = source_ip {
            ctx.insert("aws:SourceIp", ip.to_string());
        }
        let secure = parts.uri.scheme_str() == Some("https");
        ctx.insert("aws:SecureTransport", secure.to_string());

        for (name, key) in [
            (http::header::REFERER, "aws:Referer"),
            (http::header::USER_AGENT, "aws:UserAgent"),
        ] {
            if let Some(value) = parts.headers.get(name).and_then(|v| v.to_str().ok()) {
                ctx.insert(key, value);
            }
        }

        for (name, value) in &parts.headers {
            let name = name.as_str();
            if !name.starts_with("x-amz-") {
                continue;
            }
            if let Ok(value) = value.to_str() {
                ctx.insert(&format!("s3:{name}"), value);
            }
        }

        for param in parts.uri.query().unwrap_or("").split('&') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if matches!(key, "prefix" | "delimiter" | "max-keys") {
                let value = percent_encoding::percent_decode_str(value).decode_utf8_lossy();
                ctx.insert(&format!("s3:{key}"), value);
            }
        }

        ctx
    }
}

// ---------------------------------------------------------------------------
// ConditionOperator
// ---------------------------------------------------------------------------

/// Condition operators supported in bucket policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Exact, case-sensitive string match.
    StringEquals,
    /// Negated `StringEquals`.
    StringNotEquals,
    /// Exact, case-insensitive string match.
    StringEqualsIgnoreCase,
    /// Negated `StringEqualsIgnoreCase`.
    StringNotEqualsIgnoreCase,
    /// Glob match with `*` and `?`.
    StringLike,
    /// Negated `StringLike`.
    StringNotLike,
    /// Numeric equality.
    NumericEquals,
    /// Negated `NumericEquals`.
    NumericNotEquals,
    /// Request value is less than the policy value.
    NumericLessThan,
    /// Request value is at most the policy value.
    NumericLessThanEquals,
    /// Request value is greater than the policy value.
    NumericGreaterThan,
    /// Request value is at least the policy value.
    NumericGreaterThanEquals,
    /// Boolean equality.
    Bool,
    /// Request IP lies in one of the policy networks.
    IpAddress,
    /// Request IP lies in none of the policy networks.
    NotIpAddress,
    /// Key presence test (`true` means the key must be absent).
    Null,
}

impl ConditionOperator {
    /// Whether the operator is a negation, which holds when the key is absent.
    #[must_use]
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::StringNotEquals
                | Self::StringNotEqualsIgnoreCase
                | Self::StringNotLike
                | Self::NumericNotEquals
                | Self::NotIpAddress
        )
    }
}

impl FromStr for ConditionOperator {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "StringEquals" => Self::StringEquals,
            "StringNotEquals" => Self::StringNotEquals,
            "StringEqualsIgnoreCase" => Self::StringEqualsIgnoreCase,
            "StringNotEqualsIgnoreCase" => Self::StringNotEqualsIgnoreCase,
            "StringLike" => Self::StringLike,
            "StringNotLike" => Self::StringNotLike,
            "NumericEquals" => Self::NumericEquals,
            "NumericNotEquals" => Self::NumericNotEquals,
            "NumericLessThan" => Self::NumericLessThan,
            "NumericLessThanEquals" => Self::NumericLessThanEquals,
            "NumericGreaterThan" => Self::NumericGreaterThan,
            "NumericGreaterThanEquals" => Self::NumericGreaterThanEquals,
            "Bool" => Self::Bool,
            "IpAddress" => Self::IpAddress,
            "NotIpAddress" => Self::NotIpAddress,
            "Null" => Self::Null,
            other => {
                return Err(AccessError::malformed_policy(format!(
                    "unknown condition operator {other}"
                )));
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Typed condition values, checked when the policy is written.
#[derive(Debug, Clone, PartialEq)]
enum ConditionValues {
    Strings(Vec<String>),
    Numbers(Vec<f64>),
    Bools(Vec<bool>),
    Networks(Vec<IpNet>),
}

/// One compiled condition: operator, key and the values to compare against.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    operator: ConditionOperator,
    if_exists: bool,
    key: String,
    values: ConditionValues,
}

impl Condition {
    /// Compile one `operator -> key -> values` entry of a condition block.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedPolicy`] for unknown operators or
    /// values of the wrong type.
    pub fn parse(operator: &str, key: &str, raw: &Value) -> AccessResult<Self> {
        let (name, if_exists) = match operator.strip_suffix("IfExists") {
            Some(name) if name != "Null" => (name, true),
            _ => (operator, false),
        };
        let operator: ConditionOperator = name.parse()?;

        let strings = scalar_strings(raw).ok_or_else(|| {
            AccessError::malformed_policy(format!("invalid values for condition key {key}"))
        })?;
        if strings.is_empty() {
            return Err(AccessError::malformed_policy(format!(
                "condition key {key} has no values"
            )));
        }

        let values = match operator {
            ConditionOperator::NumericEquals
            | ConditionOperator::NumericNotEquals
            | ConditionOperator::NumericLessThan
            | ConditionOperator::NumericLessThanEquals
            | ConditionOperator::NumericGreaterThan
            | ConditionOperator::NumericGreaterThanEquals => ConditionValues::Numbers(
                strings
                    .iter()
                    .map(|s| s.parse::<f64>().ok())
                    .collect::<Option<_>>()
                    .ok_or_else(|| {
                        AccessError::malformed_policy(format!("{key} expects numeric values"))
                    })?,
            ),
            ConditionOperator::Bool | ConditionOperator::Null => ConditionValues::Bools(
                strings
                    .iter()
                    .map(|s| parse_bool(s))
                    .collect::<Option<_>>()
                    .ok_or_else(|| {
                        AccessError::malformed_policy(format!("{key} expects boolean values"))
                    })?,
            ),
            ConditionOperator::IpAddress | ConditionOperator::NotIpAddress => {
                ConditionValues::Networks(
                    strings
                        .iter()
                        .map(|s| parse_network(s))
                        .collect::<Option<_>>()
                        .ok_or_else(|| {
                            AccessError::malformed_policy(format!(
                                "{key} expects IP addresses or CIDR ranges"
                            ))
                        })?,
                )
            }
            _ => ConditionValues::Strings(strings),
        };

        Ok(Self {
            operator,
            if_exists,
            key: key.to_ascii_lowercase(),
            values,
        })
    }

    /// Evaluate the condition against a request context.
    #[must_use]
    pub fn evaluate(&self, ctx: &ConditionContext) -> bool {
        let Some(actual) = ctx.get(&self.key).filter(|values| !values.is_empty()) else {
            return match (&self.operator, &self.values) {
                (ConditionOperator::Null, ConditionValues::Bools(expected)) => {
                    expected.iter().any(|&b| b)
                }
                (operator, _) => operator.is_negated() || self.if_exists,
            };
        };

        let matched = match &self.values {
            ConditionValues::Strings(expected) => self.match_strings(actual, expected),
            ConditionValues::Numbers(expected) => self.match_numbers(actual, expected),
            ConditionValues::Bools(expected) => {
                if self.operator == ConditionOperator::Null {
                    return expected.iter().any(|&b| !b);
                }
                actual
                    .iter()
                    .filter_map(|a| parse_bool(a))
                    .any(|a| expected.contains(&a))
            }
            ConditionValues::Networks(networks) => actual
                .iter()
                .filter_map(|a| a.parse::<IpAddr>().ok())
                .any(|ip| networks.iter().any(|net| net.contains(&ip))),
        };

        if self.operator.is_negated() {
            !matched
        } else {
            matched
        }
    }

    /// Positive string match; negation is applied by the caller.
    fn match_strings(&self, actual: &[String], expected: &[String]) -> bool {
        actual.iter().any(|a| {
            expected.iter().any(|e| match self.operator {
                ConditionOperator::StringEquals | ConditionOperator::StringNotEquals => a == e,
                ConditionOperator::StringEqualsIgnoreCase
                | ConditionOperator::StringNotEqualsIgnoreCase => a.eq_ignore_ascii_case(e),
                _ => wildcard::is_match(e, a),
            })
        })
    }

    /// Positive numeric comparison; negation is applied by the caller.
    fn match_numbers(&self, actual: &[String], expected: &[f64]) -> bool {
        actual
            .iter()
            .filter_map(|a| a.parse::<f64>().ok())
            .any(|a| {
                expected.iter().any(|&e| match self.operator {
                    ConditionOperator::NumericLessThan => a < e,
                    ConditionOperator::NumericLessThanEquals => a <= e,
                    ConditionOperator::NumericGreaterThan => a > e,
                    ConditionOperator::NumericGreaterThanEquals => a >= e,
                    _ => (a - e).abs() < f64::EPSILON,
                })
            })
    }
}

fn scalar_strings(raw: &Value) -> Option<Vec<String>> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    match raw {
        Value::Array(items) => items.iter().map(scalar).collect(),
        other => scalar(other).map(|s| vec![s]),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_network(value: &str) -> Option<IpNet> {
    value
        .parse::<IpNet>()
        .ok()
        .or_else(|| value.parse::<IpAddr>().ok().map(IpNet::from))
}
