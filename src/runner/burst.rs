use hdrhistogram::Histogram;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::result::BurstStats;
use crate::catalog::Case;
use crate::http::{CapturedResponse, RequestExecutor, TransportError};

/// One request of a burst, with its wall-clock latency.
#[derive(Debug)]
pub struct BurstSample {
    pub index: usize,
    pub latency_us: u64,
    pub outcome: Result<CapturedResponse, TransportError>,
}

/// Issues `size` identical requests at once, one task per request. Returns
/// after every task has finished, with samples ordered by index.
pub async fn run_burst(executor: &RequestExecutor, case: &Case, size: usize) -> Vec<BurstSample> {
    let case = Arc::new(case.clone());
    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(size);
    for index in 0..size {
        let executor = executor.clone();
        let case = case.clone();
        let sample_tx = sample_tx.clone();

        let handle = tokio::spawn(async move {
            let started_at = Instant::now();
            let outcome = executor.execute(&case).await;
            let latency_us = u64::try_from(started_at.elapsed().as_micros()).unwrap_or(u64::MAX);
            let _ = sample_tx.send(BurstSample {
                index,
                latency_us,
                outcome,
            });
        });
        handles.push((index, handle));
    }
    drop(sample_tx);

    let mut crashed = Vec::new();
    for (index, handle) in handles {
        if let Err(err) = handle.await {
            warn!(case = %case.id, index, "burst worker crashed: {err}");
            crashed.push(BurstSample {
                index,
                latency_us: 0,
                outcome: Err(TransportError::new(format!("Burst worker crashed: {err}"))),
            });
        }
    }

    let mut samples = crashed;
    while let Some(sample) = sample_rx.recv().await {
        samples.push(sample);
    }
    samples.sort_by_key(|sample| sample.index);
    debug!(case = %case.id, samples = samples.len(), "burst finished");
    samples
}

fn round_to_3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn summarize(case_id: &str, samples: &[BurstSample]) -> Result<BurstStats, String> {
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3)
        .map_err(|err| format!("Failed to initialize latency histogram: {err}"))?;
    let mut status_counts = BTreeMap::new();
    let mut responses = 0;

    for sample in samples {
        histogram.saturating_record(sample.latency_us.max(1));
        if let Ok(response) = &sample.outcome {
            responses += 1;
            *status_counts.entry(response.status).or_insert(0) += 1;
        }
    }

    let to_ms = |value: u64| round_to_3(value as f64 / 1000.0);
    let empty = histogram.len() == 0;
    Ok(BurstStats {
        case_id: case_id.to_string(),
        requests: samples.len(),
        responses,
        transport_failures: samples.len() - responses,
        min_ms: if empty { 0.0 } else { to_ms(histogram.min()) },
        avg_ms: round_to_3(histogram.mean() / 1000.0),
        max_ms: if empty { 0.0 } else { to_ms(histogram.max()) },
        p50_ms: to_ms(histogram.value_at_quantile(0.50)),
        p95_ms: to_ms(histogram.value_at_quantile(0.95)),
        p99_ms: to_ms(histogram.value_at_quantile(0.99)),
        status_counts,
    })
}

impl BurstStats {
    /// Text body of the run-level burst attachment.
    pub fn render(&self) -> String {
        let statuses: Vec<String> = self
            .status_counts
            .iter()
            .map(|(status, count)| format!("{status} x{count}"))
            .collect();
        format!(
            "Case: {}\nRequests: {} ({} responses, {} transport failures)\n\
             Latency: min {}ms, avg {}ms, max {}ms\n\
             Percentiles: p50 {}ms, p95 {}ms, p99 {}ms\nStatuses: {}",
            self.case_id,
            self.requests,
            self.responses,
            self.transport_failures,
            self.min_ms,
            self.avg_ms,
            self.max_ms,
            self.p50_ms,
            self.p95_ms,
            self.p99_ms,
            statuses.join(", "),
        )
    }
}
