use serde_json::Value;

use crate::http::HttpMethod;
use crate::resources::{Field, ResourceRecord};

use super::case::CaseInput;
use super::datasets::{self, INVALID_ID, MALFORMED_IDS, NEGATIVE_ID, NONEXISTENT_ID};
use super::expectation::{BodyCheck, Expectation, SuccessCheck};
use super::family::{FieldKind, FieldProbe, ProbeTarget, ProbeValue, ResourceFamily};
use super::{Catalog, CaseSequence, CatalogError, RESPONSE_TIME_CEILING};

const PRIORITY_GET: i32 = 1;
const PRIORITY_GET_NEGATIVE: i32 = 2;
const PRIORITY_CREATE: i32 = 3;
const PRIORITY_CREATE_NEGATIVE: i32 = 4;
const PRIORITY_UPDATE: i32 = 5;
const PRIORITY_DELETE: i32 = 6;
const PRIORITY_SECURITY: i32 = 7;
const PRIORITY_BOUNDARY: i32 = 8;
const PRIORITY_PROBE: i32 = 9;
const PRIORITY_BURST: i32 = 10;

/// CRUD scenarios for one resource collection.
pub struct CrudCatalog {
    family: ResourceFamily,
    burst: Option<usize>,
}

impl CrudCatalog {
    pub fn new(family: ResourceFamily) -> Self {
        Self {
            family,
            burst: None,
        }
    }

    /// Adds a concurrency burst case issuing `size` identical reads.
    pub fn with_burst(mut self, size: usize) -> Self {
        self.burst = Some(size);
        self
    }

    pub fn family(&self) -> &ResourceFamily {
        &self.family
    }

    fn collection(&self) -> &str {
        &self.family.endpoint
    }

    fn reads(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();

        seq.add("get_collection", HttpMethod::Get, collection, |case| {
            case.label(format!("GET {collection}"))
                .tags(["smoke", "get"])
                .priority(PRIORITY_GET)
                .expect(Expectation::get_collection())
        })?;

        seq.add(
            "get_collection_response_time",
            HttpMethod::Get,
            collection,
            |case| {
                case.label(format!("GET {collection} response time"))
                    .tags(["smoke", "get", "performance"])
                    .priority(PRIORITY_GET)
                    .expect(Expectation::get_collection().within(RESPONSE_TIME_CEILING))
            },
        )?;

        for id in &self.family.valid_ids {
            seq.add("get_by_valid_id", HttpMethod::Get, &item, |case| {
                case.label(format!("GET {collection}/{{id}} with valid id {id}"))
                    .input(CaseInput::PathParam(id.to_string()))
                    .tags(["smoke", "get"])
                    .priority(PRIORITY_GET)
                    .expect(Expectation::get_by_id())
            })?;
        }

        for id in &self.family.invalid_ids {
            seq.add("get_by_invalid_id", HttpMethod::Get, &item, |case| {
                case.label(format!("GET {collection}/{{id}} with invalid id {id}"))
                    .input(CaseInput::PathParam(id.to_string()))
                    .tags(["negative", "get"])
                    .priority(PRIORITY_GET_NEGATIVE)
                    .expect(not_found_or_rejected())
            })?;
        }

        for raw in MALFORMED_IDS {
            seq.add("get_by_malformed_id", HttpMethod::Get, &item, |case| {
                case.label(format!("GET {collection}/{raw}"))
                    .input(CaseInput::PathParam(raw.to_string()))
                    .tags(["negative", "get"])
                    .priority(PRIORITY_GET_NEGATIVE)
                    .expect(not_found_or_rejected())
            })?;
        }

        for id in &self.family.boundary_ids {
            seq.add("get_by_boundary_id", HttpMethod::Get, &item, |case| {
                case.label(format!("GET {collection}/{{id}} with boundary id {id}"))
                    .input(CaseInput::PathParam(id.to_string()))
                    .tags(["boundary", "get"])
                    .priority(PRIORITY_GET_NEGATIVE)
                    .expect(Expectation::codes([200, 400, 404]).tolerate([403]))
            })?;
        }

        Ok(())
    }

    fn creates(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();

        for record in &self.family.valid_records {
            seq.add("create_valid", HttpMethod::Post, collection, |case| {
                case.label(format!("POST {collection} with valid {}", record.kind()))
                    .input(CaseInput::Record(record.clone()))
                    .tags(["smoke", "post"])
                    .priority(PRIORITY_CREATE)
                    .expect(
                        Expectation::create()
                            .on_success(SuccessCheck::new(vec![BodyCheck::required_keys(["id"])])),
                    )
            })?;
        }

        for field in &self.family.required_fields {
            let mut variants = Vec::new();
            if field.kind == FieldKind::Text {
                variants.push(("empty", Field::Value(Value::String(String::new()))));
            }
            variants.push(("null", Field::Null));
            variants.push(("absent", Field::Absent));

            for (variant, value) in variants {
                let record = self.family.template.with_field(field.name, value)?;
                seq.add("create_invalid_field", HttpMethod::Post, collection, |case| {
                    case.label(format!("POST {collection} with {variant} {}", field.name))
                        .input(CaseInput::Record(record))
                        .tags(["negative", "post"])
                        .tag(format!("field:{}", field.name))
                        .tag(format!("variant:{variant}"))
                        .priority(PRIORITY_CREATE_NEGATIVE)
                        .expect(self.family.create_rejection.clone())
                })?;
            }
        }

        seq.add("create_empty_body", HttpMethod::Post, collection, |case| {
            case.label(format!("POST {collection} with empty body"))
                .input(CaseInput::RawBody("{}".to_string()))
                .tags(["negative", "post"])
                .priority(PRIORITY_CREATE_NEGATIVE)
                .expect(self.family.create_rejection.clone())
        })?;

        for body in &self.family.malformed_bodies {
            seq.add("create_malformed", HttpMethod::Post, collection, |case| {
                case.label(format!("POST {collection} with malformed JSON {}", excerpt(body)))
                    .input(CaseInput::RawBody(body.to_string()))
                    .tags(["negative", "post"])
                    .priority(PRIORITY_CREATE_NEGATIVE)
                    .expect(Expectation::codes([400, 422]).tolerate([403]))
            })?;
        }

        Ok(())
    }

    fn updates(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();

        for (id, record) in &self.family.update_records {
            seq.add("update_valid", HttpMethod::Put, &item, |case| {
                case.label(format!("PUT {collection}/{id}"))
                    .input(CaseInput::RecordAt {
                        param: id.to_string(),
                        record: record.clone(),
                    })
                    .tags(["smoke", "put"])
                    .priority(PRIORITY_UPDATE)
                    .expect(Expectation::update())
            })?;
        }

        let nonexistent = self
            .family
            .template
            .with_field("id", Field::Value(Value::from(NONEXISTENT_ID)))?;
        seq.add("update_nonexistent", HttpMethod::Put, &item, |case| {
            case.label(format!("PUT {collection}/{NONEXISTENT_ID}"))
                .input(CaseInput::RecordAt {
                    param: NONEXISTENT_ID.to_string(),
                    record: nonexistent,
                })
                .tags(["negative", "put"])
                .priority(PRIORITY_UPDATE)
                .expect(missing_or_permissive())
        })?;

        seq.add("update_invalid_id", HttpMethod::Put, &item, |case| {
            case.label(format!("PUT {collection}/{INVALID_ID}"))
                .input(CaseInput::RecordAt {
                    param: INVALID_ID.to_string(),
                    record: self.family.template.clone(),
                })
                .tags(["negative", "put"])
                .priority(PRIORITY_UPDATE)
                .expect(not_found_or_rejected())
        })?;

        for (id, body) in &self.family.partial_updates {
            seq.add("update_partial", HttpMethod::Put, &item, |case| {
                case.label(format!("PUT {collection}/{id} with partial body {body}"))
                    .input(CaseInput::RawBodyAt {
                        param: id.to_string(),
                        body: body.to_string(),
                    })
                    .tag("put")
                    .priority(PRIORITY_UPDATE)
                    .expect(Expectation::codes([200, 204, 400]).tolerate([403]))
            })?;
        }

        Ok(())
    }

    fn deletes(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();

        seq.add("delete_existing", HttpMethod::Delete, &item, |case| {
            case.label(format!("DELETE {collection}/1"))
                .input(CaseInput::PathParam("1".to_string()))
                .tags(["smoke", "delete"])
                .priority(PRIORITY_DELETE)
                .expect(Expectation::delete())
        })?;

        seq.add("delete_nonexistent", HttpMethod::Delete, &item, |case| {
            case.label(format!("DELETE {collection}/{NONEXISTENT_ID}"))
                .input(CaseInput::PathParam(NONEXISTENT_ID.to_string()))
                .tags(["negative", "delete"])
                .priority(PRIORITY_DELETE)
                .expect(missing_or_permissive())
        })?;

        for (scenario, raw) in [
            ("delete_invalid_id", INVALID_ID),
            ("delete_negative_id", NEGATIVE_ID),
        ] {
            seq.add(scenario, HttpMethod::Delete, &item, |case| {
                case.label(format!("DELETE {collection}/{raw}"))
                    .input(CaseInput::PathParam(raw.to_string()))
                    .tags(["negative", "delete"])
                    .priority(PRIORITY_DELETE)
                    .expect(not_found_or_rejected())
            })?;
        }

        Ok(())
    }

    fn security(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();

        for payload in datasets::sql_injection_payloads(self.family.table, self.family.sql_columns) {
            seq.add("security_sql_injection", HttpMethod::Get, &item, |case| {
                case.label(format!("GET {collection}/{{id}} with SQL payload {payload}"))
                    .input(CaseInput::PathParam(payload.clone()))
                    .tag("security")
                    .priority(PRIORITY_SECURITY)
                    .expect(not_found_or_rejected())
            })?;
        }

        let field = self.family.primary_text_field;
        for payload in datasets::XSS_PAYLOADS {
            let record = self
                .family
                .template
                .with_field(field, Field::Value(Value::from(*payload)))?;
            seq.add("security_xss", HttpMethod::Post, collection, |case| {
                case.label(format!("POST {collection} with XSS payload in {field}"))
                    .input(CaseInput::Record(record))
                    .tag("security")
                    .tag(format!("field:{field}"))
                    .priority(PRIORITY_SECURITY)
                    .expect(safely_handled())
            })?;
        }

        Ok(())
    }

    fn boundaries(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        let collection = self.collection();
        let field = self.family.primary_text_field;

        for length in datasets::LONG_STRING_LENGTHS {
            let record = self
                .family
                .template
                .with_field(field, Field::Value(Value::from(datasets::long_string(*length))))?;
            seq.add("boundary_long_string", HttpMethod::Post, collection, |case| {
                case.label(format!("POST {collection} with {length}-character {field}"))
                    .input(CaseInput::Record(record))
                    .tags(["boundary", "negative"])
                    .tag(format!("field:{field}"))
                    .priority(PRIORITY_BOUNDARY)
                    .expect(Expectation::codes([400, 413, 422]).tolerate([403, 200]))
            })?;
        }

        Ok(())
    }

    fn probes(&self, seq: &mut CaseSequence) -> Result<(), CatalogError> {
        for probe in &self.family.probes {
            self.probe(seq, probe)?;
        }
        Ok(())
    }

    fn probe(&self, seq: &mut CaseSequence, probe: &FieldProbe) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();

        for value in &probe.values {
            let input = probe_input(&self.family.template, probe, value)?;
            let (method, endpoint) = match probe.target {
                ProbeTarget::Create => (HttpMethod::Post, collection),
                ProbeTarget::Update(_) => (HttpMethod::Put, item.as_str()),
            };
            let path = match probe.target {
                ProbeTarget::Create => collection.to_string(),
                ProbeTarget::Update(id) => format!("{collection}/{id}"),
            };

            seq.add(probe.name, method, endpoint, |case| {
                case.label(format!(
                    "{method} {path} with {} {}",
                    probe.field,
                    describe(value)
                ))
                .input(input)
                .tags(probe.tags.iter().copied())
                .priority(PRIORITY_PROBE)
                .expect(probe.expectation.clone())
            })?;
        }

        Ok(())
    }

    fn burst(&self, seq: &mut CaseSequence, size: usize) -> Result<(), CatalogError> {
        let collection = self.collection();
        let item = self.family.item_endpoint();
        let id = self.family.valid_ids.first().copied().unwrap_or(1);

        seq.add("concurrency_burst", HttpMethod::Get, &item, |case| {
            case.label(format!("{size} concurrent GET {collection}/{id}"))
                .input(CaseInput::PathParam(id.to_string()))
                .tags(["concurrency", "get"])
                .priority(PRIORITY_BURST)
                .burst(size)
                .expect(Expectation::get_by_id())
        })
    }
}

impl Catalog for CrudCatalog {
    fn name(&self) -> &str {
        self.family.name
    }

    fn generate(&self) -> Result<Vec<super::Case>, CatalogError> {
        let mut seq = CaseSequence::new(self.family.name);
        self.reads(&mut seq)?;
        self.creates(&mut seq)?;
        self.updates(&mut seq)?;
        self.deletes(&mut seq)?;
        self.security(&mut seq)?;
        self.boundaries(&mut seq)?;
        self.probes(&mut seq)?;
        if let Some(size) = self.burst {
            self.burst(&mut seq, size)?;
        }
        Ok(seq.finish())
    }
}

fn not_found_or_rejected() -> Expectation {
    Expectation::codes([400, 404]).tolerate([403])
}

/// Writes against ids that do not exist. The service answers some of them
/// with 200.
fn missing_or_permissive() -> Expectation {
    Expectation::codes([404, 400]).tolerate([403, 200])
}

/// Adversarial text is either rejected or stored as inert data.
fn safely_handled() -> Expectation {
    Expectation::codes([400, 422]).tolerate([403, 200])
}

fn probe_input(
    template: &ResourceRecord,
    probe: &FieldProbe,
    value: &ProbeValue,
) -> Result<CaseInput, CatalogError> {
    let template = match probe.target {
        ProbeTarget::Create => template.clone(),
        ProbeTarget::Update(id) => template.with_field("id", Field::Value(Value::from(id)))?,
    };

    let input = match (value, probe.target) {
        (ProbeValue::Field(field), ProbeTarget::Create) => {
            CaseInput::Record(template.with_field(probe.field, field.clone())?)
        }
        (ProbeValue::Field(field), ProbeTarget::Update(id)) => CaseInput::RecordAt {
            param: id.to_string(),
            record: template.with_field(probe.field, field.clone())?,
        },
        (ProbeValue::Untyped(raw), target) => {
            let mut tree = template.to_json()?;
            if let Value::Object(map) = &mut tree {
                map.insert(probe.field.to_string(), raw.clone());
            }
            let body = tree.to_string();
            match target {
                ProbeTarget::Create => CaseInput::RawBody(body),
                ProbeTarget::Update(id) => CaseInput::RawBodyAt {
                    param: id.to_string(),
                    body,
                },
            }
        }
    };

    Ok(input)
}

fn describe(value: &ProbeValue) -> String {
    match value {
        ProbeValue::Field(Field::Absent) => "<absent>".to_string(),
        ProbeValue::Field(Field::Null) => "null".to_string(),
        ProbeValue::Field(Field::Value(value)) | ProbeValue::Untyped(value) => {
            excerpt(&value.to_string())
        }
    }
}

fn excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 48;
    let count = text.chars().count();
    if count <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head}... ({count} chars)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{carts, products, users, Case};

    fn scenario<'a>(cases: &'a [Case], name: &str) -> Vec<&'a Case> {
        cases.iter().filter(|case| case.has_tag(name)).collect()
    }

    #[test]
    fn users_catalog_numbers_cases_in_generation_order() {
        let cases = CrudCatalog::new(users::family()).generate().unwrap();
        assert_eq!(cases[0].id, "users-001");
        assert_eq!(cases[0].label, "GET /users");
        assert_eq!(cases[3].id, "users-004");
        assert_eq!(cases[3].input, CaseInput::PathParam("2".to_string()));
        assert_eq!(cases[3].expectation.status_set(), "{200,404,403}");
    }

    #[test]
    fn null_and_absent_fields_are_distinct_cases() {
        let cases = CrudCatalog::new(users::family()).generate().unwrap();
        let email: Vec<&Case> = scenario(&cases, "field:email")
            .into_iter()
            .filter(|case| case.has_tag("create_invalid_field"))
            .collect();
        assert_eq!(email.len(), 3);

        let null = email.iter().find(|case| case.has_tag("variant:null")).unwrap();
        let absent = email.iter().find(|case| case.has_tag("variant:absent")).unwrap();
        assert_ne!(null.id, absent.id);

        let CaseInput::Record(null_record) = &null.input else {
            panic!("expected a record input");
        };
        let CaseInput::Record(absent_record) = &absent.input else {
            panic!("expected a record input");
        };
        assert_eq!(null_record.to_json().unwrap()["email"], Value::Null);
        assert!(absent_record.to_json().unwrap().get("email").is_none());
        assert_eq!(null.expectation.status_set(), "{400,422,403}");
    }

    #[test]
    fn numeric_fields_skip_the_empty_string_variant() {
        let cases = CrudCatalog::new(products::family()).generate().unwrap();
        let price: Vec<&Case> = scenario(&cases, "create_invalid_field")
            .into_iter()
            .filter(|case| case.has_tag("field:price"))
            .collect();
        assert_eq!(price.len(), 2);
    }

    #[test]
    fn malformed_and_sql_ids_travel_as_path_params() {
        let cases = CrudCatalog::new(carts::family()).generate().unwrap();

        let malformed: Vec<&str> = scenario(&cases, "get_by_malformed_id")
            .iter()
            .filter_map(|case| case.input.path_param())
            .collect();
        assert_eq!(malformed, vec!["abc", "@#$", "1.5"]);

        let sql = scenario(&cases, "security_sql_injection");
        assert_eq!(sql.len(), 7);
        assert!(sql.iter().all(|case| case.operation.endpoint == "/carts/{id}"));
        assert!(
            sql.iter()
                .any(|case| case.input.path_param() == Some("1; DROP TABLE carts;"))
        );
    }

    #[test]
    fn non_finite_prices_are_sent_as_quoted_tokens() {
        let cases = CrudCatalog::new(products::family()).generate().unwrap();
        let raw_bodies: Vec<String> = scenario(&cases, "extreme_price")
            .iter()
            .filter_map(|case| match &case.input {
                CaseInput::RawBody(body) => Some(body.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(raw_bodies.len(), 2);
        assert!(raw_bodies[0].contains(r#""price":"NaN""#));
        assert!(raw_bodies[1].contains(r#""price":"Infinity""#));
    }

    #[test]
    fn update_probes_target_the_item_endpoint() {
        let cases = CrudCatalog::new(products::family()).generate().unwrap();
        let update = scenario(&cases, "update_negative_price");
        assert_eq!(update.len(), 1);
        assert_eq!(update[0].operation.method, HttpMethod::Put);
        assert_eq!(update[0].input.path_param(), Some("1"));
    }

    #[test]
    fn long_strings_cover_all_lengths() {
        let cases = CrudCatalog::new(products::family()).generate().unwrap();
        let long = scenario(&cases, "boundary_long_string");
        assert_eq!(long.len(), 3);
        assert_eq!(long[2].expectation.status_set(), "{400,413,422,403,200}");
    }

    #[test]
    fn burst_case_only_exists_when_requested() {
        let plain = CrudCatalog::new(users::family()).generate().unwrap();
        assert!(plain.iter().all(|case| case.burst.is_none()));

        let bursty = CrudCatalog::new(users::family())
            .with_burst(5)
            .generate()
            .unwrap();
        let burst = scenario(&bursty, "concurrency_burst");
        assert_eq!(burst.len(), 1);
        assert_eq!(burst[0].burst, Some(5));
        assert_eq!(bursty.len(), plain.len() + 1);
    }

    #[test]
    fn create_valid_checks_for_an_id_only_on_success() {
        let cases = CrudCatalog::new(users::family()).generate().unwrap();
        let create = scenario(&cases, "create_valid");
        assert_eq!(create.len(), 3);
        let on_success = create[0].expectation.on_success.as_ref().unwrap();
        assert_eq!(on_success.statuses, vec![200, 201]);
        assert!(create[0].expectation.body.is_empty());
    }
}
