use crate::http::HttpMethod;
use crate::resources::{Credentials, Field};

use super::case::CaseInput;
use super::datasets::{self, auth};
use super::expectation::{BodyCheck, Expectation, SuccessCheck};
use super::{Catalog, CaseSequence, CatalogError, RESPONSE_TIME_CEILING};

const LONG_CREDENTIAL: usize = 10_000;

/// Login endpoint scenarios.
pub struct AuthCatalog {
    endpoint: String,
}

impl AuthCatalog {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    fn login(
        &self,
        seq: &mut CaseSequence,
        scenario: Scenario,
        label: String,
        input: CaseInput,
        expectation: Expectation,
    ) -> Result<(), CatalogError> {
        seq.add(scenario.name, HttpMethod::Post, &self.endpoint, |case| {
            case.label(label)
                .input(input)
                .tag("auth")
                .tags(scenario.tags)
                .priority(scenario.priority)
                .expect(expectation)
        })
    }
}

/// Scenario name, selection tags and priority shared by a group of cases.
struct Scenario {
    name: &'static str,
    tags: Vec<String>,
    priority: i32,
}

impl Scenario {
    fn new(name: &'static str, priority: i32, tags: &[&str]) -> Self {
        Self {
            name,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            priority,
        }
    }

    fn field(mut self, field: &str) -> Self {
        self.tags.push(format!("field:{field}"));
        self
    }
}

fn credentials(username: &str, password: &str) -> CaseInput {
    CaseInput::Record(Credentials::new(username, password).into())
}

fn rejected() -> Expectation {
    Expectation::codes([400, 401]).tolerate([403])
}

fn login_succeeds() -> Result<Expectation, CatalogError> {
    Ok(Expectation::codes([200, 201])
        .tolerate([403])
        .on_success(SuccessCheck::new(vec![
            BodyCheck::non_null("token"),
            BodyCheck::matches("token", r"\S+")?,
        ])))
}

fn is_valid_login(username: &str, password: &str) -> bool {
    auth::VALID_LOGINS.contains(&(username, password))
}

impl Catalog for AuthCatalog {
    fn name(&self) -> &str {
        "auth"
    }

    fn generate(&self) -> Result<Vec<super::Case>, CatalogError> {
        let mut seq = CaseSequence::new("auth");
        let endpoint = self.endpoint.as_str();

        for (username, password) in auth::VALID_LOGINS {
            self.login(
                &mut seq,
                Scenario::new("login_valid", 1, &["smoke"]),
                format!("POST {endpoint} as {username}"),
                credentials(username, password),
                login_succeeds()?,
            )?;
        }

        let invalid: [(Credentials, &str); 11] = [
            (Credentials::new("wrong_user", "83r5^_"), "username"),
            (Credentials::new("mor_2314", "wrong_password"), "password"),
            (Credentials::new("wrong_user", "wrong_password"), "both"),
            (Credentials::new("", "83r5^_"), "username"),
            (Credentials::new("mor_2314", ""), "password"),
            (Credentials::new("", ""), "both"),
            (
                Credentials {
                    username: Field::Null,
                    password: "83r5^_".into(),
                },
                "username",
            ),
            (
                Credentials {
                    username: "mor_2314".into(),
                    password: Field::Null,
                },
                "password",
            ),
            (Credentials::new("MOR_2314", "83r5^_"), "username"),
            (Credentials::new("mor 2314", "83r5^_"), "username"),
            (Credentials::new("mor_2314", "83r5^ _"), "password"),
        ];
        for (record, field) in invalid {
            self.login(
                &mut seq,
                Scenario::new("login_invalid_credentials", 2, &["negative"]).field(field),
                format!("POST {endpoint} with invalid {field}"),
                CaseInput::Record(record.into()),
                rejected(),
            )?;
        }

        self.login(
            &mut seq,
            Scenario::new("login_empty_body", 3, &["negative"]),
            format!("POST {endpoint} with empty body"),
            CaseInput::RawBody("{}".to_string()),
            rejected(),
        )?;

        let missing = [
            (
                "login_missing_username",
                "username",
                Credentials {
                    username: Field::Absent,
                    password: "m38rmF$".into(),
                },
            ),
            (
                "login_missing_password",
                "password",
                Credentials {
                    username: "mor_2314".into(),
                    password: Field::Absent,
                },
            ),
        ];
        for (name, field, record) in missing {
            self.login(
                &mut seq,
                Scenario::new(name, 4, &["negative", "variant:absent"]).field(field),
                format!("POST {endpoint} without {field}"),
                CaseInput::Record(record.into()),
                rejected(),
            )?;
        }

        let nulls = Credentials {
            username: Field::Null,
            password: Field::Null,
        };
        self.login(
            &mut seq,
            Scenario::new("login_null_values", 4, &["negative", "variant:null"]),
            format!("POST {endpoint} with null username and password"),
            CaseInput::Record(nulls.into()),
            rejected(),
        )?;

        for body in auth::MALFORMED_BODIES {
            self.login(
                &mut seq,
                Scenario::new("login_malformed", 5, &["negative"]),
                format!("POST {endpoint} with malformed JSON {body}"),
                CaseInput::RawBody(body.to_string()),
                rejected(),
            )?;
        }

        for payload in auth::SQL_INJECTION {
            self.login(
                &mut seq,
                Scenario::new("login_sql_injection", 6, &["security"]),
                format!("POST {endpoint} with SQL payload {payload}"),
                credentials(payload, payload),
                rejected(),
            )?;
        }

        for payload in datasets::XSS_PAYLOADS.iter().chain(auth::EXTRA_XSS) {
            self.login(
                &mut seq,
                Scenario::new("login_xss", 6, &["security"]),
                format!("POST {endpoint} with XSS payload {payload}"),
                credentials(payload, "password123"),
                rejected(),
            )?;
        }

        let long = "a".repeat(LONG_CREDENTIAL);
        for (field, record) in [
            ("username", Credentials::new(&long, "83r5^_")),
            ("password", Credentials::new("mor_2314", &long)),
        ] {
            self.login(
                &mut seq,
                Scenario::new("login_long_credentials", 7, &["boundary"]).field(field),
                format!("POST {endpoint} with {LONG_CREDENTIAL}-character {field}"),
                CaseInput::Record(record.into()),
                Expectation::codes([400, 401, 413]).tolerate([403]),
            )?;
        }

        for (username, password) in auth::SPECIAL_CHARACTERS {
            self.login(
                &mut seq,
                Scenario::new("login_special_characters", 8, &["negative"]),
                format!("POST {endpoint} with special characters {username:?}"),
                credentials(username, password),
                Expectation::codes([400, 401]).tolerate([403, 200]),
            )?;
        }

        for length in auth::BOUNDARY_LENGTHS {
            self.login(
                &mut seq,
                Scenario::new("login_boundary_length", 8, &["boundary"]),
                format!("POST {endpoint} with {length}-character credentials"),
                credentials(&"a".repeat(*length), &"b".repeat(*length)),
                rejected(),
            )?;
        }

        for (username, password) in auth::ENCODINGS {
            self.login(
                &mut seq,
                Scenario::new("login_encoding", 8, &["boundary"]),
                format!("POST {endpoint} with encoded username {username}"),
                credentials(username, password),
                rejected(),
            )?;
        }

        for (username, password) in auth::CASE_VARIATIONS {
            let expectation = if is_valid_login(username, password) {
                login_succeeds()?
            } else {
                rejected()
            };
            self.login(
                &mut seq,
                Scenario::new("login_case_variation", 8, &["negative"]),
                format!("POST {endpoint} with case variation {username}"),
                credentials(username, password),
                expectation,
            )?;
        }

        for (username, password) in auth::NUMERIC {
            self.login(
                &mut seq,
                Scenario::new("login_numeric", 8, &["negative"]),
                format!("POST {endpoint} with numeric credentials {username}"),
                credentials(username, password),
                rejected(),
            )?;
        }

        for (username, password) in auth::WHITESPACE {
            self.login(
                &mut seq,
                Scenario::new("login_whitespace", 8, &["negative"]),
                format!("POST {endpoint} with whitespace variant {username:?}"),
                credentials(username, password),
                Expectation::codes([400, 401]).tolerate([403, 200]),
            )?;
        }

        let (username, password) = auth::VALID_LOGINS[0];
        self.login(
            &mut seq,
            Scenario::new("login_response_time", 9, &["performance"]),
            format!("POST {endpoint} response time"),
            credentials(username, password),
            Expectation::codes([200, 201, 401])
                .tolerate([403])
                .within(RESPONSE_TIME_CEILING),
        )?;

        Ok(seq.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Case;
    use serde_json::Value;

    fn generate() -> Vec<Case> {
        AuthCatalog::new("/auth/login").generate().unwrap()
    }

    fn body(case: &Case) -> Value {
        match &case.input {
            CaseInput::Record(record) => record.to_json().unwrap(),
            CaseInput::RawBody(raw) => serde_json::from_str(raw).unwrap_or(Value::Null),
            other => panic!("unexpected input {other:?}"),
        }
    }

    #[test]
    fn valid_logins_soft_check_the_token() {
        let cases = generate();
        let valid: Vec<&Case> = cases.iter().filter(|c| c.has_tag("login_valid")).collect();
        assert_eq!(valid.len(), 5);

        let on_success = valid[0].expectation.on_success.as_ref().unwrap();
        assert_eq!(on_success.checks.len(), 2);
        assert_eq!(body(valid[0])["username"], "mor_2314");
    }

    #[test]
    fn missing_fields_are_absent_not_null() {
        let cases = generate();
        let missing_username = cases
            .iter()
            .find(|c| c.has_tag("login_missing_username"))
            .unwrap();
        let missing_password = cases
            .iter()
            .find(|c| c.has_tag("login_missing_password"))
            .unwrap();
        let nulls = cases.iter().find(|c| c.has_tag("login_null_values")).unwrap();

        assert_eq!(
            body(missing_username),
            serde_json::json!({"password": "m38rmF$"})
        );
        assert_eq!(
            body(missing_password),
            serde_json::json!({"username": "mor_2314"})
        );
        assert_eq!(
            body(nulls),
            serde_json::json!({"username": null, "password": null})
        );
    }

    #[test]
    fn long_credentials_accept_payload_too_large() {
        let cases = generate();
        let long: Vec<&Case> = cases
            .iter()
            .filter(|c| c.has_tag("login_long_credentials"))
            .collect();
        assert_eq!(long.len(), 2);
        assert_eq!(long[0].expectation.status_set(), "{400,401,413,403}");
        assert_eq!(
            body(long[0])["username"].as_str().unwrap().len(),
            LONG_CREDENTIAL
        );
    }

    #[test]
    fn exact_case_variation_expects_success() {
        let cases = generate();
        let variations: Vec<&Case> = cases
            .iter()
            .filter(|c| c.has_tag("login_case_variation"))
            .collect();
        let succeeding: Vec<&&Case> = variations
            .iter()
            .filter(|c| c.expectation.on_success.is_some())
            .collect();
        assert_eq!(variations.len(), 8);
        assert_eq!(succeeding.len(), 1);
    }

    #[test]
    fn special_characters_tolerate_observed_success() {
        let cases = generate();
        let special = cases
            .iter()
            .find(|c| c.has_tag("login_special_characters"))
            .unwrap();
        assert_eq!(special.expectation.status_set(), "{400,401,403,200}");
    }

    #[test]
    fn response_time_case_has_a_ceiling() {
        let cases = generate();
        let timed = cases
            .iter()
            .find(|c| c.has_tag("login_response_time"))
            .unwrap();
        assert_eq!(timed.expectation.max_elapsed, Some(RESPONSE_TIME_CEILING));
        assert!(timed.has_tag("performance"));
    }
}
