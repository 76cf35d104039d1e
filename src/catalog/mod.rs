//! # Case Catalogs
//!
//! A catalog is a pure generator of [`Case`]s. Calling
//! [`Catalog::generate`] twice yields the same cases in the same order;
//! catalogs hold no state between calls.
//!
//! - [`CrudCatalog`] covers one resource collection, parametrized by a
//!   [`ResourceFamily`] (`users`, `products`, `carts`).
//! - [`AuthCatalog`] covers the login endpoint.
//! - [`ConnectivityCatalog`] is the reachability stage that runs first.

pub mod auth;
pub mod carts;
pub mod case;
pub mod connectivity;
pub mod crud;
pub mod datasets;
pub mod expectation;
pub mod family;
pub mod products;
pub mod users;

pub use auth::AuthCatalog;
pub use case::{Case, CaseBuilder, CaseInput, HeaderPolicy, Operation};
pub use connectivity::ConnectivityCatalog;
pub use crud::CrudCatalog;
pub use expectation::{BodyCheck, Expectation, StatusMatch, StatusPattern, SuccessCheck};
pub use family::{FieldProbe, ProbeValue, ResourceFamily};

use std::time::Duration;
use thiserror::Error;

use crate::config::HarnessConfig;
use crate::http::HttpMethod;
use crate::resources::RecordError;

/// Ceiling used by the response-time cases.
pub const RESPONSE_TIME_CEILING: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("case `{case}` has an empty acceptable status set")]
    EmptyStatusSet { case: String },
    #[error("case `{case}` has an inverted status range {lo}-{hi}")]
    InvalidStatusRange { case: String, lo: u16, hi: u16 },
    #[error("case `{case}` has no expectation")]
    MissingExpectation { case: String },
    #[error("case `{case}`: endpoint `{endpoint}` and input disagree on the path parameter")]
    PathParameter { case: String, endpoint: String },
    #[error("case `{case}` has a burst size of zero")]
    InvalidBurst { case: String },
    #[error("invalid body pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    InvalidField(#[from] RecordError),
}

/// Execution stage. Catalogs run in stage order, connectivity first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Connectivity,
    Functional,
}

pub trait Catalog: Send + Sync {
    fn name(&self) -> &str;

    fn stage(&self) -> Stage {
        Stage::Functional
    }

    fn generate(&self) -> Result<Vec<Case>, CatalogError>;
}

/// Numbers cases `<catalog>-001`, `<catalog>-002`, ... and tags each one with
/// its catalog and scenario names.
pub(crate) struct CaseSequence {
    catalog: String,
    cases: Vec<Case>,
}

impl CaseSequence {
    pub(crate) fn new(catalog: &str) -> Self {
        Self {
            catalog: catalog.to_string(),
            cases: Vec::new(),
        }
    }

    pub(crate) fn add<F>(
        &mut self,
        scenario: &str,
        method: HttpMethod,
        endpoint: &str,
        configure: F,
    ) -> Result<(), CatalogError>
    where
        F: FnOnce(CaseBuilder) -> CaseBuilder,
    {
        let id = format!("{}-{:03}", self.catalog, self.cases.len() + 1);
        let builder = Case::builder(&self.catalog, id, method, endpoint)
            .tag(self.catalog.as_str())
            .tag(scenario);
        self.cases.push(configure(builder).build()?);
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<Case> {
        self.cases
    }
}

/// The full suite for a configuration: connectivity, the three CRUD
/// families and the login endpoint.
pub fn default_catalogs(config: &HarnessConfig) -> Vec<Box<dyn Catalog>> {
    let burst = config.burst_size;
    let crud = |family: ResourceFamily| {
        let catalog = CrudCatalog::new(family);
        match burst {
            Some(size) => catalog.with_burst(size),
            None => catalog,
        }
    };

    vec![
        Box::new(ConnectivityCatalog::new(&config.endpoints.users)),
        Box::new(crud(users::family().with_endpoint(&config.endpoints.users))),
        Box::new(crud(
            products::family().with_endpoint(&config.endpoints.products),
        )),
        Box::new(crud(carts::family().with_endpoint(&config.endpoints.carts))),
        Box::new(AuthCatalog::new(&config.endpoints.login)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogs_generate_without_errors() {
        let config = HarnessConfig {
            burst_size: Some(3),
            ..HarnessConfig::default()
        };
        let catalogs = default_catalogs(&config);
        let names: Vec<&str> = catalogs.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["connectivity", "users", "products", "carts", "auth"]
        );
        assert_eq!(catalogs[0].stage(), Stage::Connectivity);

        for catalog in &catalogs {
            let cases = catalog.generate().unwrap();
            assert!(!cases.is_empty(), "{} generated nothing", catalog.name());
        }
    }

    #[test]
    fn case_ids_are_unique_across_the_suite() {
        let catalogs = default_catalogs(&HarnessConfig::default());
        let mut seen = std::collections::BTreeSet::new();
        for catalog in &catalogs {
            for case in catalog.generate().unwrap() {
                assert!(seen.insert(case.id.clone()), "duplicate id {}", case.id);
            }
        }
    }

    #[test]
    fn generate_is_idempotent_for_every_catalog() {
        let config = HarnessConfig {
            burst_size: Some(5),
            ..HarnessConfig::default()
        };
        for catalog in default_catalogs(&config) {
            let first = serde_json::to_string(&catalog.generate().unwrap()).unwrap();
            let second = serde_json::to_string(&catalog.generate().unwrap()).unwrap();
            assert_eq!(first, second, "{} is not restartable", catalog.name());
        }
    }

    #[test]
    fn sequence_rejects_invalid_cases() {
        let mut sequence = CaseSequence::new("users");
        let result = sequence.add("broken", HttpMethod::Get, "/users", |case| {
            case.expect(Expectation::new())
        });
        assert!(matches!(result, Err(CatalogError::EmptyStatusSet { .. })));
        assert!(sequence.finish().is_empty());
    }
}
