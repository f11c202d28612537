//! Domain logic for tgate.
//!
//! This crate is intentionally I/O-free: it does math and policy.

use statrs::statistics::Statistics;
use tgate_types::{
    Aggregate, BenchmarkRecord, CheckPolicy, ThroughputSummary, Verdict, VerdictStatus,
};

pub use tgate_error::DomainError;

/// Events per second for each record.
///
/// Runtimes must be strictly positive and every sample finite; a zero runtime
/// would otherwise produce an infinite sample that passes any threshold.
pub fn throughput_samples(records: &[BenchmarkRecord]) -> Result<Vec<f64>, DomainError> {
    records
        .iter()
        .map(|r| {
            if r.runtime_s.is_nan() || r.runtime_s <= 0.0 {
                return Err(DomainError::NonPositiveRuntime {
                    row: r.row,
                    runtime: r.runtime_s,
                });
            }
            let sample = r.events / r.runtime_s;
            if !sample.is_finite() {
                return Err(DomainError::NonFiniteSample {
                    row: r.row,
                    events: r.events,
                    runtime: r.runtime_s,
                });
            }
            Ok(sample)
        })
        .collect()
}

pub fn summarize_throughput(samples: &[f64]) -> Result<ThroughputSummary, DomainError> {
    if samples.is_empty() {
        return Err(DomainError::NoSamples);
    }

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = samples.iter().mean();
    let stddev = samples.iter().population_std_dev();

    // Finite samples can still overflow the variance.
    if !mean.is_finite() || !stddev.is_finite() {
        return Err(DomainError::NonFiniteAggregate { mean, stddev });
    }

    Ok(ThroughputSummary {
        count: samples.len(),
        mean,
        stddev,
        min,
        max,
    })
}

pub fn aggregate_metric(summary: &ThroughputSummary, aggregate: Aggregate) -> f64 {
    match aggregate {
        Aggregate::Mean => summary.mean,
        Aggregate::MeanPlusStddev => summary.mean + summary.stddev,
    }
}

/// Pass only when `metric` is strictly above `threshold`.
pub fn evaluate(metric: f64, threshold: f64) -> Verdict {
    if metric > threshold {
        Verdict {
            status: VerdictStatus::Pass,
            reasons: Vec::new(),
        }
    } else {
        Verdict {
            status: VerdictStatus::Fail,
            reasons: vec![format!(
                "throughput {metric:.6} events/second is not above threshold {threshold:.6}"
            )],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub summary: ThroughputSummary,
    pub metric: f64,
    pub verdict: Verdict,
}

/// Run the whole check over already-loaded records.
pub fn check_records(
    records: &[BenchmarkRecord],
    policy: &CheckPolicy,
) -> Result<Evaluation, DomainError> {
    let samples = throughput_samples(records)?;
    let summary = summarize_throughput(&samples)?;
    let metric = aggregate_metric(&summary, policy.aggregate);
    if !metric.is_finite() {
        return Err(DomainError::NonFiniteAggregate {
            mean: summary.mean,
            stddev: summary.stddev,
        });
    }
    let verdict = evaluate(metric, policy.threshold);

    Ok(Evaluation {
        summary,
        metric,
        verdict,
    })
}
