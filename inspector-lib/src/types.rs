//! Core data types for username probing.
//!
//! This module defines the targets handed to the engine, the rules that
//! classify a response, the results and per-target reports the engine
//! produces, and the engine configuration.

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for the number of concurrent probes.
pub const MAX_CONCURRENCY: usize = 100;

/// Rule deciding, from an HTTP response, whether the username exists.
///
/// Rules are pure values so catalogues stay data-driven and can be loaded
/// from configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchRule {
    /// Status code equals the given value
    StatusEquals { status: u16 },

    /// Status code lies within `min..=max`
    StatusInRange { min: u16, max: u16 },

    /// Status code is one of the listed values
    StatusOneOf { statuses: Vec<u16> },
}

impl MatchRule {
    /// Evaluate the rule against a response.
    pub fn matches(&self, response: &ProbeResponse) -> bool {
        let status = response.status;
        match self {
            MatchRule::StatusEquals { status: expected } => status == *expected,
            MatchRule::StatusInRange { min, max } => (*min..=*max).contains(&status),
            MatchRule::StatusOneOf { statuses } => statuses.contains(&status),
        }
    }
}

impl Default for MatchRule {
    /// A profile page that answers `200 OK` means the username exists.
    fn default() -> Self {
        MatchRule::StatusEquals { status: 200 }
    }
}

/// The part of an HTTP response that match rules inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
}

impl ProbeResponse {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

/// One platform to check for a given username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeTarget {
    /// Human-readable platform name (e.g. "GitHub")
    pub name: String,

    /// Fully resolved request URL
    pub url: String,

    /// Rule applied to the response
    pub rule: MatchRule,
}

impl ProbeTarget {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U, rule: MatchRule) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            rule,
        }
    }
}

/// A confirmed match: the username exists on this platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub url: String,
}

/// Terminal state of a single probe.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// Request completed and the rule matched
    Matched { status: u16 },

    /// Request completed but the rule did not match
    NotMatched { status: u16 },

    /// Request failed at the transport level
    Failed { error: ProbeError },
}

/// Everything the engine learned about one target.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub name: String,
    pub url: String,
    pub outcome: ProbeOutcome,

    /// Time spent in flight (excludes waiting for an admission slot)
    pub elapsed: Duration,
}

impl ProbeReport {
    pub fn is_match(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Matched { .. })
    }

    /// Convert into a result if this report is a match.
    pub fn into_result(self) -> Option<ProbeResult> {
        match self.outcome {
            ProbeOutcome::Matched { .. } => Some(ProbeResult {
                name: self.name,
                url: self.url,
            }),
            _ => None,
        }
    }
}

/// Configuration options for a probe engine.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Maximum number of requests in flight at once
    /// Default: available parallelism, Range: 1-100
    pub concurrency: usize,

    /// Timeout for each individual request
    /// Default: 10 seconds
    pub timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("inspector/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ProbeConfig {
    /// Set the concurrency limit, clamped to 1-100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Number of processing units on this host, clamped to the concurrency range.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_CONCURRENCY)
}
