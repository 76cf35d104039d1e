use crate::http::HttpMethod;

use super::case::CaseInput;
use super::expectation::{BodyCheck, Expectation, SuccessCheck};
use super::{Case, Catalog, CaseSequence, CatalogError, RESPONSE_TIME_CEILING, Stage};

/// Reachability checks run before anything else. The reachability case
/// accepts any non-5xx answer; the pipeline case accepts any HTTP answer at
/// all, since only a transport failure means the request never got through.
pub struct ConnectivityCatalog {
    users_endpoint: String,
}

impl ConnectivityCatalog {
    pub fn new(users_endpoint: &str) -> Self {
        Self {
            users_endpoint: users_endpoint.to_string(),
        }
    }
}

fn non_empty_on_ok() -> SuccessCheck {
    SuccessCheck::new(vec![BodyCheck::NonEmptyBody]).with_statuses([200])
}

impl Catalog for ConnectivityCatalog {
    fn name(&self) -> &str {
        "connectivity"
    }

    fn stage(&self) -> Stage {
        Stage::Connectivity
    }

    fn generate(&self) -> Result<Vec<Case>, CatalogError> {
        let mut seq = CaseSequence::new("connectivity");
        let users = self.users_endpoint.trim_end_matches('/');
        let item = format!("{users}/{{id}}");

        seq.add("reachability", HttpMethod::Get, &item, |case| {
            case.label(format!("API reachability via GET {users}/1"))
                .input(CaseInput::PathParam("1".to_string()))
                .tag("smoke")
                .priority(-9)
                .expect(
                    Expectation::new()
                        .accept_range(200, 499)
                        .within(RESPONSE_TIME_CEILING)
                        .on_success(non_empty_on_ok()),
                )
        })?;

        seq.add("framework", HttpMethod::Get, users, |case| {
            case.label(format!("Request pipeline via GET {users}"))
                .tag("smoke")
                .priority(-8)
                .expect(
                    Expectation::new()
                        .accept_range(200, 599)
                        .within(RESPONSE_TIME_CEILING)
                        .on_success(non_empty_on_ok()),
                )
        })?;

        Ok(seq.finish())
    }
}
