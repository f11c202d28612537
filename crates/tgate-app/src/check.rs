//! CheckUseCase - the throughput gate.
//!
//! Given records already read from the benchmark file and a resolved policy:
//! 1. Derives one throughput sample per record
//! 2. Reduces the samples with the policy's aggregate
//! 3. Compares the aggregate to the threshold
//! 4. Wraps everything into a `tgate.check.v1` receipt

use crate::Clock;
use anyhow::Context;
use std::path::PathBuf;
use tgate_domain::check_records;
use tgate_types::{
    BenchmarkRecord, CHECK_SCHEMA_V1, CheckPolicy, CheckReceipt, InputMeta, RunMeta, ToolInfo,
    VerdictStatus,
};

/// Request for the check use case.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// Where the records came from (recorded in the receipt).
    pub input_path: PathBuf,

    /// Parsed benchmark rows.
    pub records: Vec<BenchmarkRecord>,

    /// Resolved threshold, aggregate and column names.
    pub policy: CheckPolicy,

    /// Tool info for the receipt.
    pub tool: ToolInfo,
}

/// Outcome of the check use case.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub receipt: CheckReceipt,

    /// True if the aggregate did not exceed the threshold.
    pub failed: bool,
}

/// Use case for evaluating a benchmark results table.
pub struct CheckUseCase<C: Clock> {
    clock: C,
}

impl<C: Clock> CheckUseCase<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn execute(&self, req: CheckRequest) -> anyhow::Result<CheckOutcome> {
        let started_at = self.clock.now_rfc3339();

        let evaluation = check_records(&req.records, &req.policy).with_context(|| {
            format!(
                "cannot compute throughput from {}",
                req.input_path.display()
            )
        })?;

        let failed = evaluation.verdict.status == VerdictStatus::Fail;
        tracing::info!(
            rows = req.records.len(),
            aggregate = %req.policy.aggregate,
            metric = evaluation.metric,
            threshold = req.policy.threshold,
            passed = !failed,
            "throughput check evaluated"
        );

        let receipt = CheckReceipt {
            schema: CHECK_SCHEMA_V1.to_string(),
            tool: req.tool,
            run: RunMeta {
                started_at,
                ended_at: self.clock.now_rfc3339(),
            },
            input: InputMeta {
                path: req.input_path.display().to_string(),
                rows: req.records.len(),
            },
            policy: req.policy,
            summary: evaluation.summary,
            metric: evaluation.metric,
            verdict: evaluation.verdict,
        };

        Ok(CheckOutcome { receipt, failed })
    }
}
