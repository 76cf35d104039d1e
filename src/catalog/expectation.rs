use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::{self, Display};
use std::time::Duration;

use super::CatalogError;

/// One entry of the accepted status set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPattern {
    Code(u16),
    /// Inclusive on both ends.
    Range(u16, u16),
}

impl StatusPattern {
    pub fn contains(self, status: u16) -> bool {
        match self {
            StatusPattern::Code(code) => code == status,
            StatusPattern::Range(lo, hi) => (lo..=hi).contains(&status),
        }
    }
}

impl Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPattern::Code(code) => write!(f, "{code}"),
            StatusPattern::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// A hard check on the response body. Paths are dotted (`data.items.0.id`);
/// numeric segments index into arrays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyCheck {
    RequiredKeys(Vec<String>),
    NonNull(String),
    Matches {
        path: String,
        #[serde(serialize_with = "serialize_regex")]
        regex: Regex,
    },
    NonEmptyBody,
}

impl BodyCheck {
    pub fn required_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BodyCheck::RequiredKeys(keys.into_iter().map(Into::into).collect())
    }

    pub fn non_null(path: &str) -> Self {
        BodyCheck::NonNull(path.to_string())
    }

    pub fn matches(path: &str, pattern: &str) -> Result<Self, CatalogError> {
        let regex = Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(BodyCheck::Matches {
            path: path.to_string(),
            regex,
        })
    }

    /// Runs the check; on failure returns the path that was missing or
    /// invalid.
    pub fn evaluate(&self, body: &str, parsed: Option<&Value>) -> Result<(), String> {
        match self {
            BodyCheck::RequiredKeys(paths) => {
                for path in paths {
                    if parsed.and_then(|tree| lookup(tree, path)).is_none() {
                        return Err(path.clone());
                    }
                }
                Ok(())
            }
            BodyCheck::NonNull(path) => match parsed.and_then(|tree| lookup(tree, path)) {
                Some(value) if !value.is_null() => Ok(()),
                _ => Err(path.clone()),
            },
            BodyCheck::Matches { path, regex } => {
                let matched = parsed
                    .and_then(|tree| lookup(tree, path))
                    .is_some_and(|value| match value {
                        Value::String(text) => regex.is_match(text),
                        Value::Null => false,
                        other => regex.is_match(&other.to_string()),
                    });
                if matched { Ok(()) } else { Err(path.clone()) }
            }
            BodyCheck::NonEmptyBody => {
                if body.trim().is_empty() {
                    Err("body".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

/// Resolves a dotted path inside a JSON tree.
pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(tree, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Checks that only run when the response status is in `statuses`. Their
/// failures are warnings, never a failed verdict.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessCheck {
    pub statuses: Vec<u16>,
    pub checks: Vec<BodyCheck>,
}

impl SuccessCheck {
    pub fn new(checks: Vec<BodyCheck>) -> Self {
        Self {
            statuses: vec![200, 201],
            checks,
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn applies_to(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }
}

/// How a status relates to an expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatch {
    Accepted,
    Tolerated,
    Unexpected,
}

/// The outcome contract of one case.
///
/// `accepted` holds the statuses the API contract allows. `tolerated` holds
/// statuses that pass only as inconclusive: access-policy 403s and statuses
/// the service is known to return where it should reject.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Expectation {
    pub accepted: Vec<StatusPattern>,
    pub tolerated: Vec<u16>,
    pub max_elapsed: Option<Duration>,
    pub body: Vec<BodyCheck>,
    pub on_success: Option<SuccessCheck>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(codes: impl IntoIterator<Item = u16>) -> Self {
        Self::new().accept_codes(codes)
    }

    pub fn accept(mut self, pattern: StatusPattern) -> Self {
        if !self.accepted.contains(&pattern) {
            self.accepted.push(pattern);
        }
        self
    }

    pub fn accept_codes(self, codes: impl IntoIterator<Item = u16>) -> Self {
        codes
            .into_iter()
            .fold(self, |expectation, code| expectation.accept(StatusPattern::Code(code)))
    }

    pub fn accept_range(self, lo: u16, hi: u16) -> Self {
        self.accept(StatusPattern::Range(lo, hi))
    }

    pub fn tolerate(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        for code in codes {
            if !self.tolerated.contains(&code) {
                self.tolerated.push(code);
            }
        }
        self
    }

    pub fn within(mut self, ceiling: Duration) -> Self {
        self.max_elapsed = Some(ceiling);
        self
    }

    pub fn check(mut self, check: BodyCheck) -> Self {
        self.body.push(check);
        self
    }

    pub fn on_success(mut self, check: SuccessCheck) -> Self {
        self.on_success = Some(check);
        self
    }

    pub fn get_collection() -> Self {
        Self::codes([200]).tolerate([403])
    }

    pub fn get_by_id() -> Self {
        Self::codes([200, 404]).tolerate([403])
    }

    pub fn create() -> Self {
        Self::codes([200, 201]).tolerate([403])
    }

    pub fn update() -> Self {
        Self::codes([200, 204]).tolerate([403])
    }

    pub fn delete() -> Self {
        Self::codes([200, 204]).tolerate([403])
    }

    pub fn classify(&self, status: u16) -> StatusMatch {
        if self.accepted.iter().any(|pattern| pattern.contains(status)) {
            StatusMatch::Accepted
        } else if self.tolerated.contains(&status) {
            StatusMatch::Tolerated
        } else {
            StatusMatch::Unexpected
        }
    }

    pub fn validate(&self, case: &str) -> Result<(), CatalogError> {
        if self.accepted.is_empty() && self.tolerated.is_empty() {
            return Err(CatalogError::EmptyStatusSet {
                case: case.to_string(),
            });
        }
        for pattern in &self.accepted {
            if let StatusPattern::Range(lo, hi) = *pattern {
                if lo > hi {
                    return Err(CatalogError::InvalidStatusRange {
                        case: case.to_string(),
                        lo,
                        hi,
                    });
                }
            }
        }
        Ok(())
    }

    /// The acceptable set as `{accepted...,tolerated...}`.
    pub fn status_set(&self) -> String {
        let entries: Vec<String> = self
            .accepted
            .iter()
            .map(ToString::to_string)
            .chain(self.tolerated.iter().map(ToString::to_string))
            .collect();
        format!("{{{}}}", entries.join(","))
    }
}
