//! # Outcome Validation
//!
//! Compares a captured response against a case's [`Expectation`] in a fixed
//! order: status gate, response-time ceiling, hard body checks and finally
//! the success-only checks, whose failures are warnings.

use serde::Serialize;
use std::fmt::{self, Display};
use std::time::Duration;

use crate::catalog::{Expectation, StatusMatch};
use crate::http::CapturedResponse;

/// Why a request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureKind {
    Timeout,
    ConnectionRefused,
    DnsFailure,
    TlsFailure,
    Unknown,
}

impl TransportFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportFailureKind::Timeout => "timeout",
            TransportFailureKind::ConnectionRefused => "connection_refused",
            TransportFailureKind::DnsFailure => "dns_failure",
            TransportFailureKind::TlsFailure => "tls_failure",
            TransportFailureKind::Unknown => "unknown",
        }
    }
}

impl Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailReason {
    UnexpectedStatus { status: u16, expected: String },
    ExceededTimeBudget { elapsed_ms: u64, ceiling_ms: u64 },
    InvalidField { path: String },
}

impl Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::UnexpectedStatus { status, expected } => {
                write!(f, "unexpected status {status} not in {expected}")
            }
            FailReason::ExceededTimeBudget { .. } => f.write_str("exceeded time budget"),
            FailReason::InvalidField { path } => write!(f, "missing/invalid field {path}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    /// `tolerated` is set when the status was only in the tolerated list.
    Pass { tolerated: bool },
    Fail(FailReason),
    Inconclusive { kind: TransportFailureKind },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass { tolerated: false } => "PASS",
            Verdict::Pass { tolerated: true } => "PASS (tolerated)",
            Verdict::Fail(_) => "FAIL",
            Verdict::Inconclusive { .. } => "INCONCLUSIVE",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fail(reason) => write!(f, "FAIL: {reason}"),
            Verdict::Inconclusive { kind } => write!(f, "INCONCLUSIVE: {kind}"),
            pass => f.write_str(pass.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub verdict: Verdict,
    pub warnings: Vec<String>,
}

impl Validation {
    fn fail(reason: FailReason) -> Self {
        Self {
            verdict: Verdict::Fail(reason),
            warnings: Vec::new(),
        }
    }

    pub fn inconclusive(kind: TransportFailureKind) -> Self {
        Self {
            verdict: Verdict::Inconclusive { kind },
            warnings: Vec::new(),
        }
    }
}

pub fn validate(expectation: &Expectation, response: &CapturedResponse) -> Validation {
    let tolerated = match expectation.classify(response.status) {
        StatusMatch::Accepted => false,
        StatusMatch::Tolerated => true,
        StatusMatch::Unexpected => {
            return Validation::fail(FailReason::UnexpectedStatus {
                status: response.status,
                expected: expectation.status_set(),
            });
        }
    };

    if let Some(ceiling) = expectation.max_elapsed {
        if Duration::from_millis(response.elapsed_ms) >= ceiling {
            return Validation::fail(FailReason::ExceededTimeBudget {
                elapsed_ms: response.elapsed_ms,
                ceiling_ms: u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX),
            });
        }
    }

    let parsed = response.parsed_body.as_ref();
    for check in &expectation.body {
        if let Err(path) = check.evaluate(&response.body, parsed) {
            return Validation::fail(FailReason::InvalidField { path });
        }
    }

    let mut warnings = Vec::new();
    if let Some(on_success) = &expectation.on_success {
        if on_success.applies_to(response.status) {
            for check in &on_success.checks {
                if let Err(path) = check.evaluate(&response.body, parsed) {
                    warnings.push(format!(
                        "status {} succeeded but field {path} is missing or invalid",
                        response.status
                    ));
                }
            }
        }
    }

    Validation {
        verdict: Verdict::Pass { tolerated },
        warnings,
    }
}
