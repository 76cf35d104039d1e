//! # Run Orchestration
//!
//! Generates every catalog up front, orders the cases (connectivity stage
//! first, then by priority inside each catalog) and executes them one at a
//! time. A failing case never stops the run. Burst cases are the only place
//! with more than one request in flight; see [`burst`].

pub mod burst;
pub mod result;

pub use result::{BurstStats, CaseOutcome, CaseRecord, RunResult, RunState, RunSummary};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::catalog::{Case, Catalog, CatalogError};
use crate::config::{ConfigError, HarnessConfig, Selection};
use crate::http::{CapturedResponse, RequestExecutor, Transport, TransportError};
use crate::report::{DiagnosticReporter, Event, EventSink, classify_transport_error};
use crate::validate::{Verdict, validate};

pub const ENVIRONMENT_ATTACHMENT: &str = "Environment";
pub const BURST_ATTACHMENT: &str = "Concurrency Burst";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

pub struct Runner {
    config: HarnessConfig,
    executor: RequestExecutor,
    reporter: DiagnosticReporter,
    sink: Arc<dyn EventSink>,
    state: RunState,
}

impl Runner {
    pub fn new(
        config: HarnessConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let executor = RequestExecutor::new(&config, transport)?;
        let reporter = DiagnosticReporter::new(sink.clone(), config.body_excerpt_limit);

        Ok(Self {
            config,
            executor,
            reporter,
            sink,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Generates and orders every selected case. Nothing is sent if any
    /// catalog fails to generate.
    pub fn plan(
        &self,
        catalogs: &[Box<dyn Catalog>],
        selection: &Selection,
    ) -> Result<Vec<Case>, CatalogError> {
        let mut ordered: Vec<&dyn Catalog> = catalogs.iter().map(|catalog| catalog.as_ref()).collect();
        ordered.sort_by_key(|catalog| catalog.stage());

        let mut plan = Vec::new();
        for catalog in ordered {
            let mut cases = catalog.generate()?;
            cases.sort_by_key(|case| case.priority);
            let generated = cases.len();
            plan.extend(cases.into_iter().filter(|case| selection.matches(&case.tags)));
            info!(catalog = catalog.name(), generated, "catalog generated");
        }
        Ok(plan)
    }

    pub async fn run(
        &mut self,
        catalogs: &[Box<dyn Catalog>],
        selection: &Selection,
    ) -> Result<RunResult, CatalogError> {
        let plan = self.plan(catalogs, selection)?;
        let mut result = RunResult::new(now_ms());

        self.state = RunState::Running;
        result.state = RunState::Running;
        info!(
            cases = plan.len(),
            base_url = %self.config.base_url,
            "starting conformance run"
        );
        self.sink.emit(Event::Attachment {
            case_id: None,
            name: ENVIRONMENT_ATTACHMENT.to_string(),
            content: self.environment(plan.len()),
        });

        for case in &plan {
            match case.burst {
                Some(size) => self.run_burst(case, size, &mut result).await,
                None => {
                    let outcome = self.executor.execute(case).await;
                    self.record(case, None, outcome, &mut result);
                }
            }
        }

        result.finished_at_ms = now_ms();
        result.summary.duration_ms = result.finished_at_ms.saturating_sub(result.started_at_ms);
        result.state = RunState::Completed;
        self.state = RunState::Completed;

        self.sink.on_run_complete(&result);
        Ok(result)
    }

    async fn run_burst(&self, case: &Case, size: usize, result: &mut RunResult) {
        let samples = burst::run_burst(&self.executor, case, size).await;

        match burst::summarize(&case.id, &samples) {
            Ok(stats) => {
                self.sink.emit(Event::Attachment {
                    case_id: Some(case.id.clone()),
                    name: BURST_ATTACHMENT.to_string(),
                    content: stats.render(),
                });
                result.bursts.push(stats);
            }
            Err(err) => warn!(case = %case.id, "{err}"),
        }

        for sample in samples {
            self.record(case, Some(sample.index), sample.outcome, result);
        }
    }

    fn record(
        &self,
        case: &Case,
        sample: Option<usize>,
        outcome: Result<CapturedResponse, TransportError>,
        result: &mut RunResult,
    ) {
        let url = self
            .executor
            .resolve_url(&case.operation.endpoint, case.input.path_param())
            .map(String::from)
            .unwrap_or_else(|_| case.operation.endpoint.clone());

        let validation = match &outcome {
            Ok(response) => validate(&case.expectation, response),
            Err(error) => self.reporter.transport_validation(error),
        };
        self.reporter.on_result(case, &url, &outcome, &validation);

        let outcome = match outcome {
            Ok(response) => CaseOutcome::Response(response.summary()),
            Err(error) => CaseOutcome::TransportFailure {
                kind: match validation.verdict {
                    Verdict::Inconclusive { kind } => kind,
                    _ => classify_transport_error(&error.message),
                },
                message: error.message,
            },
        };

        result.push(CaseRecord {
            case_id: case.id.clone(),
            label: case.label.clone(),
            catalog: case.catalog.clone(),
            method: case.operation.method,
            url,
            tags: case.tags.iter().cloned().collect(),
            sample,
            outcome,
            verdict: validation.verdict,
            warnings: validation.warnings,
        });
    }

    fn environment(&self, cases: usize) -> String {
        let cpu_count = std::thread::available_parallelism()
            .map(|value| value.get())
            .unwrap_or(1);
        format!(
            "Base URL: {}\nTimeout: {}ms\nUser-Agent: {}\nVerify TLS: {}\nCases: {cases}\n\
             OS: {} ({})\nCPUs: {cpu_count}\nVersion: {}",
            self.config.base_url,
            self.config.timeout_ms,
            self.config.user_agent,
            self.config.verify_ssl,
            std::env::consts::OS,
            std::env::consts::ARCH,
            env!("CARGO_PKG_VERSION"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CaseInput, Expectation, Stage};
    use crate::http::{HttpMethod, ScriptedTransport, TransportResponse};
    use crate::report::{RecordingSink, StepStatus};
    use crate::validate::TransportFailureKind;

    struct FixedCatalog {
        name: &'static str,
        stage: Stage,
        cases: Vec<(i32, &'static str)>,
    }

    impl Catalog for FixedCatalog {
        fn name(&self) -> &str {
            self.name
        }

        fn stage(&self) -> Stage {
            self.stage
        }

        fn generate(&self) -> Result<Vec<Case>, CatalogError> {
            self.cases
                .iter()
                .enumerate()
                .map(|(n, (priority, tag))| {
                    let id = format!("{}-{:03}", self.name, n + 1);
                    Case::builder(self.name, id, HttpMethod::Get, "/users")
                        .tag(*tag)
                        .priority(*priority)
                        .expect(Expectation::get_collection())
                        .build()
                })
                .collect()
        }
    }

    struct BrokenCatalog;

    impl Catalog for BrokenCatalog {
        fn name(&self) -> &str {
            "broken"
        }

        fn generate(&self) -> Result<Vec<Case>, CatalogError> {
            Case::builder("broken", "broken-001", HttpMethod::Get, "/users")
                .expect(Expectation::new())
                .build()
                .map(|case| vec![case])
        }
    }

    struct CaseList(Vec<Case>);

    impl Catalog for CaseList {
        fn name(&self) -> &str {
            "users"
        }

        fn generate(&self) -> Result<Vec<Case>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    fn runner(transport: Arc<ScriptedTransport>) -> (Runner, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let runner = Runner::new(HarnessConfig::default(), transport, sink.clone()).unwrap();
        (runner, sink)
    }

    #[test]
    fn plan_orders_by_stage_then_priority() {
        let (runner, _) = runner(Arc::new(ScriptedTransport::new()));
        let catalogs: Vec<Box<dyn Catalog>> = vec![
            Box::new(FixedCatalog {
                name: "users",
                stage: Stage::Functional,
                cases: vec![(5, "write"), (1, "read"), (1, "smoke")],
            }),
            Box::new(FixedCatalog {
                name: "connectivity",
                stage: Stage::Connectivity,
                cases: vec![(0, "smoke")],
            }),
        ];

        let plan = runner.plan(&catalogs, &Selection::default()).unwrap();
        let ids: Vec<&str> = plan.iter().map(|case| case.id.as_str()).collect();
        assert_eq!(ids, vec!["connectivity-001", "users-002", "users-003", "users-001"]);

        let smoke_only = Selection {
            include_tags: ["smoke".to_string()].into(),
            ..Selection::default()
        };
        let plan = runner.plan(&catalogs, &smoke_only).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[tokio::test]
    async fn catalog_errors_abort_before_any_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let (mut runner, sink) = runner(transport.clone());
        let catalogs: Vec<Box<dyn Catalog>> = vec![
            Box::new(FixedCatalog {
                name: "users",
                stage: Stage::Functional,
                cases: vec![(1, "read")],
            }),
            Box::new(BrokenCatalog),
        ];

        let err = runner.run(&catalogs, &Selection::default()).await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyStatusSet { .. }));
        assert!(transport.requests().await.is_empty());
        assert!(sink.events().is_empty());
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[test]
    fn unusable_user_agent_is_rejected_up_front() {
        let config = HarnessConfig {
            user_agent: "bad\nagent".to_string(),
            ..HarnessConfig::default()
        };
        let err = Runner::new(
            config,
            Arc::new(ScriptedTransport::new()),
            Arc::new(RecordingSink::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidUserAgent { .. }));
    }

    #[tokio::test]
    async fn every_case_runs_and_is_counted() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(TransportResponse::json(200, r#"{"id":1,"username":"johnd"}"#))
                .respond(TransportResponse::json(200, r#"{"id":11}"#))
                .fail("timeout: error sending request for url")
                .respond(TransportResponse::new(403, "Forbidden")),
        );
        let (mut runner, sink) = runner(transport.clone());

        let cases = vec![
            Case::builder("users", "users-001", HttpMethod::Get, "/users/{id}")
                .input(CaseInput::PathParam("1".to_string()))
                .expect(Expectation::get_by_id())
                .build()
                .unwrap(),
            Case::builder("users", "users-002", HttpMethod::Post, "/users")
                .input(CaseInput::RawBody("{}".to_string()))
                .expect(Expectation::codes([400, 422]).tolerate([403]))
                .build()
                .unwrap(),
            Case::builder("users", "users-003", HttpMethod::Get, "/users")
                .expect(Expectation::get_collection())
                .build()
                .unwrap(),
            Case::builder("users", "users-004", HttpMethod::Delete, "/users/{id}")
                .input(CaseInput::PathParam("1".to_string()))
                .expect(Expectation::delete())
                .build()
                .unwrap(),
        ];
        let catalogs: Vec<Box<dyn Catalog>> = vec![Box::new(CaseList(cases))];

        let result = runner.run(&catalogs, &Selection::default()).await.unwrap();

        assert_eq!(runner.state(), RunState::Completed);
        assert_eq!(result.state, RunState::Completed);
        assert_eq!(transport.requests().await.len(), 4);
        assert_eq!(result.summary.total, 4);
        assert_eq!(result.summary.passed, 2);
        assert_eq!(result.summary.tolerated, 1);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.inconclusive, 1);

        assert_eq!(result.records[0].url, "https://fakestoreapi.com/users/1");
        assert!(matches!(
            &result.records[1].verdict,
            Verdict::Fail(reason) if reason.to_string() == "unexpected status 200 not in {400,422,403}"
        ));
        assert!(matches!(
            result.records[2].outcome,
            CaseOutcome::TransportFailure {
                kind: TransportFailureKind::Timeout,
                ..
            }
        ));

        let pass_events = sink.events_for("users-001");
        assert_eq!(pass_events.len(), 1);
        assert!(matches!(
            pass_events[0],
            Event::Step {
                status: StepStatus::Passed,
                ..
            }
        ));
        assert!(sink.events_for("users-002").iter().any(Event::is_attachment));
        assert_eq!(sink.result().unwrap().summary, result.summary);
    }

    #[tokio::test]
    async fn burst_cases_record_every_sample() {
        let transport = Arc::new(ScriptedTransport::with_handler(|_| {
            Ok(TransportResponse::json(200, r#"{"id":1}"#))
        }));
        let (mut runner, sink) = runner(transport.clone());
        let case = Case::builder("users", "users-001", HttpMethod::Get, "/users/{id}")
            .input(CaseInput::PathParam("1".to_string()))
            .expect(Expectation::get_by_id())
            .burst(3)
            .build()
            .unwrap();
        let catalogs: Vec<Box<dyn Catalog>> = vec![Box::new(CaseList(vec![case]))];

        let result = runner.run(&catalogs, &Selection::default()).await.unwrap();

        assert_eq!(transport.requests().await.len(), 3);
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.passed, 3);
        let samples: Vec<Option<usize>> = result.records.iter().map(|record| record.sample).collect();
        assert_eq!(samples, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(result.bursts.len(), 1);
        assert_eq!(result.bursts[0].responses, 3);
        assert!(sink.events().iter().any(|event| matches!(
            event,
            Event::Attachment { name, .. } if name == BURST_ATTACHMENT
        )));
    }
}
