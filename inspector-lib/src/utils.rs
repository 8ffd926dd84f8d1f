//! Utility functions for input validation and parsing.
//!
//! This module contains helpers shared by the library configuration layer
//! and the CLI: username validation and human-friendly duration parsing.

use crate::error::ProbeError;
use regex::Regex;
use std::time::Duration;

/// Longest username accepted by [`validate_username`].
pub const MAX_USERNAME_LEN: usize = 64;

lazy_static::lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

/// Validate a username before it is substituted into platform URLs.
///
/// The catalogue inserts usernames verbatim, so anything that is not a plain
/// URL path segment is rejected here.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(ProbeError::InvalidUsername)` if invalid.
pub fn validate_username(username: &str) -> Result<(), ProbeError> {
    if username.trim().is_empty() {
        return Err(ProbeError::invalid_username(
            username,
            "Username cannot be empty",
        ));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(ProbeError::invalid_username(
            username,
            format!("Username longer than {} characters", MAX_USERNAME_LEN),
        ));
    }

    if username == "." || username == ".." {
        return Err(ProbeError::invalid_username(
            username,
            "Username cannot be a relative path",
        ));
    }

    if !USERNAME_RE.is_match(username) {
        return Err(ProbeError::invalid_username(
            username,
            "Only letters, digits, '.', '_' and '-' are allowed",
        ));
    }

    Ok(())
}

/// Parse a duration string like "500ms", "5s", "2m".
///
/// A bare number is taken as seconds. Zero durations are rejected since a
/// zero request timeout would fail every probe.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let duration = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
