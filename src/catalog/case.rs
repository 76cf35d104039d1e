use serde::Serialize;
use std::collections::BTreeSet;

use crate::http::HttpMethod;
use crate::resources::{RecordError, ResourceRecord};

use super::expectation::Expectation;
use super::CatalogError;

/// Which headers accompany the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// `Content-Type`, `Accept` and `User-Agent`.
    Json,
    /// `Accept` and `User-Agent` only.
    NoContentType,
}

impl HeaderPolicy {
    pub fn for_method(method: HttpMethod) -> Self {
        if method.sends_body() {
            HeaderPolicy::Json
        } else {
            HeaderPolicy::NoContentType
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub method: HttpMethod,
    /// Path template relative to the base URL, e.g. `/users/{id}`.
    pub endpoint: String,
}

impl Operation {
    pub fn has_placeholder(&self) -> bool {
        self.endpoint.split('/').any(is_placeholder)
    }
}

pub fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseInput {
    None,
    Record(ResourceRecord),
    RawBody(String),
    PathParam(String),
    RecordAt {
        param: String,
        record: ResourceRecord,
    },
    RawBodyAt {
        param: String,
        body: String,
    },
}

impl CaseInput {
    pub fn path_param(&self) -> Option<&str> {
        match self {
            CaseInput::PathParam(param)
            | CaseInput::RecordAt { param, .. }
            | CaseInput::RawBodyAt { param, .. } => Some(param),
            CaseInput::None | CaseInput::Record(_) | CaseInput::RawBody(_) => None,
        }
    }

    /// The request body as it goes on the wire. Raw bodies are sent as-is.
    pub fn body(&self) -> Result<Option<String>, RecordError> {
        match self {
            CaseInput::Record(record) | CaseInput::RecordAt { record, .. } => {
                record.to_body().map(Some)
            }
            CaseInput::RawBody(body) | CaseInput::RawBodyAt { body, .. } => Ok(Some(body.clone())),
            CaseInput::None | CaseInput::PathParam(_) => Ok(None),
        }
    }
}

/// One executable unit: an input, the outcome it must produce, and a label.
#[derive(Debug, Clone, Serialize)]
pub struct Case {
    pub id: String,
    pub label: String,
    pub catalog: String,
    pub operation: Operation,
    pub input: CaseInput,
    pub expectation: Expectation,
    pub tags: BTreeSet<String>,
    pub priority: i32,
    pub header_policy: HeaderPolicy,
    /// When set, the request is issued this many times concurrently.
    pub burst: Option<usize>,
}

impl Case {
    pub fn builder(
        catalog: &str,
        id: impl Into<String>,
        method: HttpMethod,
        endpoint: &str,
    ) -> CaseBuilder {
        CaseBuilder {
            id: id.into(),
            label: None,
            catalog: catalog.to_string(),
            operation: Operation {
                method,
                endpoint: endpoint.to_string(),
            },
            input: CaseInput::None,
            expectation: None,
            tags: BTreeSet::new(),
            priority: 0,
            header_policy: None,
            burst: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

pub struct CaseBuilder {
    id: String,
    label: Option<String>,
    catalog: String,
    operation: Operation,
    input: CaseInput,
    expectation: Option<Expectation>,
    tags: BTreeSet<String>,
    priority: i32,
    header_policy: Option<HeaderPolicy>,
    burst: Option<usize>,
}

impl CaseBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn input(mut self, input: CaseInput) -> Self {
        self.input = input;
        self
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectation = Some(expectation);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn header_policy(mut self, policy: HeaderPolicy) -> Self {
        self.header_policy = Some(policy);
        self
    }

    pub fn burst(mut self, size: usize) -> Self {
        self.burst = Some(size);
        self
    }

    pub fn build(self) -> Result<Case, CatalogError> {
        let expectation = self
            .expectation
            .ok_or_else(|| CatalogError::MissingExpectation {
                case: self.id.clone(),
            })?;
        expectation.validate(&self.id)?;

        if self.operation.has_placeholder() != self.input.path_param().is_some() {
            return Err(CatalogError::PathParameter {
                case: self.id,
                endpoint: self.operation.endpoint,
            });
        }
        if self.burst == Some(0) {
            return Err(CatalogError::InvalidBurst { case: self.id });
        }

        let header_policy = self
            .header_policy
            .unwrap_or_else(|| HeaderPolicy::for_method(self.operation.method));
        let label = self
            .label
            .unwrap_or_else(|| format!("{} {}", self.operation.method, self.operation.endpoint));

        Ok(Case {
            id: self.id,
            label,
            catalog: self.catalog,
            operation: self.operation,
            input: self.input,
            expectation,
            tags: self.tags,
            priority: self.priority,
            header_policy,
            burst: self.burst,
        })
    }
}
