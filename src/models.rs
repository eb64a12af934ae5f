//! Typed results decoded from API responses.
//!
//! Decoding never fails: the API is trusted to send the documented shape, and
//! any field that is missing or has an unexpected type takes its default
//! value instead.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

type Object = Map<String, Value>;

fn bool_field(data: &Object, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn u64_field(data: &Object, key: &str) -> u64 {
    opt_u64_field(data, key).unwrap_or(0)
}

fn opt_u64_field(data: &Object, key: &str) -> Option<u64> {
    data.get(key).and_then(Value::as_u64)
}

fn f64_field(data: &Object, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn string_field(data: &Object, key: &str, default: &str) -> String {
    opt_string_field(data, key).unwrap_or_else(|| default.to_string())
}

fn opt_string_field(data: &Object, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Returns the nested object under `key`, or an empty object.
fn object_field(data: &Object, key: &str) -> Object {
    match data.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => Object::new(),
    }
}

fn as_object(value: &Value) -> Object {
    match value {
        Value::Object(map) => map.clone(),
        _ => Object::new(),
    }
}

/// Server-assessed deliverability of an address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachable {
    /// The mailbox accepts mail.
    Valid,
    /// The mailbox does not exist or rejects mail.
    Invalid,
    /// The mailbox may accept mail, but delivery is uncertain (catch-all, full
    /// inbox, ...).
    Risky,
    /// Deliverability could not be determined.
    #[default]
    Unknown,
}

impl Reachable {
    /// Parses the API's label. Unrecognized labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "valid" => Reachable::Valid,
            "invalid" => Reachable::Invalid,
            "risky" => Reachable::Risky,
            _ => Reachable::Unknown,
        }
    }

    /// Returns the API's label for this value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachable::Valid => "valid",
            Reachable::Invalid => "invalid",
            Reachable::Risky => "risky",
            Reachable::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Reachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the syntax check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyntaxValidation {
    pub valid: bool,
    pub username: String,
    pub domain: String,
}

impl SyntaxValidation {
    pub fn from_json(data: &Object) -> Self {
        Self {
            valid: bool_field(data, "valid"),
            username: string_field(data, "username", ""),
            domain: string_field(data, "domain", ""),
        }
    }
}

/// Result of the MX record lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MxValidation {
    pub valid: bool,
    /// MX hosts found for the domain. Non-string entries are skipped.
    pub records: Vec<String>,
}

impl MxValidation {
    pub fn from_json(data: &Object) -> Self {
        let records = match data.get("records") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Self {
            valid: bool_field(data, "valid"),
            records,
        }
    }
}

/// Result of the SMTP mailbox probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpValidation {
    pub valid: bool,
    /// Probe outcome as reported by the server; `"unknown"` if absent.
    pub state: String,
}

impl SmtpValidation {
    pub fn from_json(data: &Object) -> Self {
        Self {
            valid: bool_field(data, "valid"),
            state: string_field(data, "state", "unknown"),
        }
    }
}

/// Validation result for a single address.
///
/// # Examples
///
/// ```
/// use verifykit::{Reachable, ValidationResult};
/// use serde_json::json;
///
/// let data = json!({
///     "email": "user@gmial.com",
///     "valid": true,
///     "reachable": "risky",
///     "did_you_mean": "user@gmail.com"
/// });
///
/// let result = ValidationResult::from_json(data.as_object().unwrap());
/// assert_eq!(result.reachable, Reachable::Risky);
/// assert_eq!(result.did_you_mean.as_deref(), Some("user@gmail.com"));
/// assert!(result.smtp.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub email: String,
    pub valid: bool,
    pub reachable: Reachable,
    pub syntax: SyntaxValidation,
    pub mx: MxValidation,
    /// `None` when no SMTP probe was attempted.
    pub smtp: Option<SmtpValidation>,
    pub disposable: bool,
    pub role_based: bool,
    pub free_email: bool,
    /// Quality score in `[0, 1]`.
    pub score: f64,
    pub quality_grade: Option<String>,
    pub reason: Option<String>,
    /// Suggested correction for a likely typo.
    pub did_you_mean: Option<String>,
}

impl ValidationResult {
    pub fn from_json(data: &Object) -> Self {
        let smtp = match data.get("smtp") {
            Some(Value::Object(map)) => Some(SmtpValidation::from_json(map)),
            _ => None,
        };

        Self {
            email: string_field(data, "email", ""),
            valid: bool_field(data, "valid"),
            reachable: data
                .get("reachable")
                .and_then(Value::as_str)
                .map(Reachable::from_label)
                .unwrap_or_default(),
            syntax: SyntaxValidation::from_json(&object_field(data, "syntax")),
            mx: MxValidation::from_json(&object_field(data, "mx")),
            smtp,
            disposable: bool_field(data, "disposable"),
            role_based: bool_field(data, "role_based"),
            free_email: bool_field(data, "free_email"),
            score: f64_field(data, "score"),
            quality_grade: opt_string_field(data, "quality_grade"),
            reason: opt_string_field(data, "reason"),
            did_you_mean: opt_string_field(data, "did_you_mean"),
        }
    }

    /// Returns `true` if the address is valid and the mailbox is reachable.
    pub fn is_deliverable(&self) -> bool {
        self.valid && self.reachable == Reachable::Valid
    }
}

/// Aggregate counts for a bulk validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkValidationSummary {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
    pub risky: u64,
    pub processing_time_ms: u64,
    /// Duplicates removed by the server.
    pub duplicates_removed: u64,
    /// Set when the request ran into the monthly quota part way through.
    pub quota_exceeded: Option<bool>,
    pub emails_skipped: Option<u64>,
    pub quota_remaining: Option<u64>,
    pub message: Option<String>,
}

impl BulkValidationSummary {
    pub fn from_json(data: &Object) -> Self {
        Self {
            total: u64_field(data, "total"),
            valid: u64_field(data, "valid"),
            invalid: u64_field(data, "invalid"),
            risky: u64_field(data, "risky"),
            processing_time_ms: u64_field(data, "processing_time_ms"),
            duplicates_removed: u64_field(data, "duplicates_removed"),
            quota_exceeded: data.get("quota_exceeded").and_then(Value::as_bool),
            emails_skipped: opt_u64_field(data, "emails_skipped"),
            quota_remaining: opt_u64_field(data, "quota_remaining"),
            message: opt_string_field(data, "message"),
        }
    }
}

/// Results of a bulk validation, in the order the addresses were sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkValidationResult {
    pub results: Vec<ValidationResult>,
    pub summary: BulkValidationSummary,
}

impl BulkValidationResult {
    pub fn from_json(data: &Object) -> Self {
        let results = match data.get("results") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| ValidationResult::from_json(&as_object(item)))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            results,
            summary: BulkValidationSummary::from_json(&object_field(data, "summary")),
        }
    }
}

/// Account usage for the current billing period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStats {
    pub current: u64,
    pub limit: u64,
    /// As reported by the server; not recomputed locally.
    pub remaining: u64,
    pub percentage: f64,
    pub period_start: String,
    pub period_end: String,
}

impl UsageStats {
    pub fn from_json(data: &Object) -> Self {
        Self {
            current: u64_field(data, "current"),
            limit: u64_field(data, "limit"),
            remaining: u64_field(data, "remaining"),
            percentage: f64_field(data, "percentage"),
            period_start: string_field(data, "period_start", ""),
            period_end: string_field(data, "period_end", ""),
        }
    }
}
