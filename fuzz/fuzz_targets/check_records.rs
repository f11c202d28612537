#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tgate_types::{Aggregate, BenchmarkRecord, CheckPolicy, VerdictStatus};

#[derive(Debug, Arbitrary)]
struct Input {
    rows: Vec<(f64, f64)>,
    threshold: f64,
    strict: bool,
}

fuzz_target!(|input: Input| {
    let records: Vec<BenchmarkRecord> = input
        .rows
        .iter()
        .enumerate()
        .map(|(i, &(events, runtime_s))| BenchmarkRecord {
            row: i + 1,
            events,
            runtime_s,
        })
        .collect();

    let policy = CheckPolicy {
        threshold: input.threshold,
        aggregate: if input.strict {
            Aggregate::MeanPlusStddev
        } else {
            Aggregate::Mean
        },
        ..CheckPolicy::default()
    };

    if let Ok(eval) = tgate_domain::check_records(&records, &policy) {
        assert!(eval.metric.is_finite());
        // A pass always means strictly above the threshold.
        if eval.verdict.status == VerdictStatus::Pass {
            assert!(eval.metric > policy.threshold);
        }
    }
});
