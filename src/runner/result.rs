use serde::Serialize;
use std::collections::BTreeMap;

use crate::http::{HttpMethod, ResponseSummary};
use crate::validate::{TransportFailureKind, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaseOutcome {
    Response(ResponseSummary),
    TransportFailure {
        kind: TransportFailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub case_id: String,
    pub label: String,
    pub catalog: String,
    pub method: HttpMethod,
    pub url: String,
    pub tags: Vec<String>,
    /// Position inside a burst; `None` for ordinary cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<usize>,
    pub outcome: CaseOutcome,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Counts per verdict. Tolerated passes are counted in `passed` as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub tolerated: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn record(&mut self, verdict: &Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Pass { tolerated } => {
                self.passed += 1;
                if *tolerated {
                    self.tolerated += 1;
                }
            }
            Verdict::Fail(_) => self.failed += 1,
            Verdict::Inconclusive { .. } => self.inconclusive += 1,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 * 100.0 / self.total as f64
    }
}

/// Latency figures for one concurrency burst, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurstStats {
    pub case_id: String,
    pub requests: usize,
    pub responses: usize,
    pub transport_failures: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub status_counts: BTreeMap<u16, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub state: RunState,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    pub summary: RunSummary,
    pub records: Vec<CaseRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bursts: Vec<BurstStats>,
}

impl RunResult {
    pub fn new(started_at_ms: u64) -> Self {
        Self {
            state: RunState::Idle,
            started_at_ms,
            finished_at_ms: started_at_ms,
            summary: RunSummary::default(),
            records: Vec::new(),
            bursts: Vec::new(),
        }
    }

    /// The single write path into the result.
    pub fn push(&mut self, record: CaseRecord) {
        self.summary.record(&record.verdict);
        self.records.push(record);
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter().filter(|record| record.verdict.is_fail())
    }

    pub fn inconclusive(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records
            .iter()
            .filter(|record| matches!(record.verdict, Verdict::Inconclusive { .. }))
    }
}
