//! Local input checks run before any request is sent.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// The largest list accepted by a single bulk request.
pub const MAX_BULK_EMAILS: usize = 1000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    )
    .expect("email regex is valid")
});

/// Returns `true` if `email` is a syntactically valid address.
///
/// Dot-atom local parts only; quoted local parts and IP literals are
/// rejected. The local part is limited to 64 octets and the whole address to
/// 254.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, _)) = email.rsplit_once('@') else {
        return false;
    };
    local.len() <= 64 && email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Returns `true` if `url` is an absolute URL with a host, in any scheme.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Returns `true` if `url` is an absolute `http` or `https` URL with a host.
pub fn is_valid_http_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

pub(crate) fn check_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(Error::validation(
            "Email is required and must be a non-empty string",
            "INVALID_EMAIL",
        ));
    }
    if !is_valid_email(email) {
        return Err(Error::validation(
            "Invalid email format",
            "INVALID_EMAIL_FORMAT",
        ));
    }
    Ok(())
}

pub(crate) fn check_webhook(webhook: Option<&str>) -> Result<()> {
    match webhook {
        Some(url) if !is_valid_url(url) => Err(Error::validation(
            "Invalid webhook URL",
            "INVALID_WEBHOOK_URL",
        )),
        _ => Ok(()),
    }
}

/// Checks a bulk list. Stops at the first malformed address and names it.
pub(crate) fn check_bulk<S: AsRef<str>>(emails: &[S]) -> Result<()> {
    if emails.is_empty() {
        return Err(Error::validation(
            "Emails array cannot be empty",
            "EMPTY_EMAILS",
        ));
    }
    if emails.len() > MAX_BULK_EMAILS {
        return Err(Error::validation(
            format!("Maximum {} emails per request", MAX_BULK_EMAILS),
            "TOO_MANY_EMAILS",
        ));
    }
    if let Some(bad) = emails
        .iter()
        .map(AsRef::as_ref)
        .find(|email| !is_valid_email(email))
    {
        return Err(Error::validation(
            format!("Invalid email format: {}", bad),
            "INVALID_EMAIL_FORMAT",
        ));
    }
    Ok(())
}

/// Removes duplicates, keeping the first occurrence of each address in its
/// original position. Returns the unique list and the number removed.
pub(crate) fn dedupe<S: AsRef<str>>(emails: &[S]) -> (Vec<String>, usize) {
    let mut seen = HashSet::with_capacity(emails.len());
    let unique: Vec<String> = emails
        .iter()
        .map(AsRef::as_ref)
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect();
    let removed = emails.len() - unique.len();
    (unique, removed)
}
