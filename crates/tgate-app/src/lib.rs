//! Application layer for tgate.
//!
//! The app layer coordinates domain logic and renders results.
//! It does not parse CLI flags and it does not do filesystem I/O.

mod check;

pub use check::{CheckOutcome, CheckRequest, CheckUseCase};

use tgate_types::{CheckReceipt, VerdictStatus};

pub trait Clock: Send + Sync {
    fn now_rfc3339(&self) -> String;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        use time::format_description::well_known::Rfc3339;
        time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }
}

/// The single stdout line of a check, e.g. `10000000.000000 events/second`.
pub fn render_metric_line(receipt: &CheckReceipt) -> String {
    format!("{:.6} events/second", receipt.metric)
}

pub fn render_markdown(receipt: &CheckReceipt) -> String {
    let mut out = String::new();

    let header = match receipt.verdict.status {
        VerdictStatus::Pass => "✅ tgate: pass",
        VerdictStatus::Fail => "❌ tgate: fail",
    };

    out.push_str(header);
    out.push_str("\n\n");

    out.push_str(&format!(
        "**Input:** `{}` ({} rows)\n\n",
        receipt.input.path, receipt.input.rows
    ));

    out.push_str("| aggregate | value | threshold | status |\n");
    out.push_str("|---|---:|---:|---|\n");

    let status_icon = match receipt.verdict.status {
        VerdictStatus::Pass => "✅",
        VerdictStatus::Fail => "❌",
    };

    out.push_str(&format!(
        "| `{agg}` | {v} | {t} | {status} |\n\n",
        agg = receipt.policy.aggregate,
        v = format_rate(receipt.metric),
        t = format_rate(receipt.policy.threshold),
        status = status_icon,
    ));

    let s = &receipt.summary;
    out.push_str("| samples | mean | stddev | min | max |\n");
    out.push_str("|---:|---:|---:|---:|---:|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n",
        s.count,
        format_rate(s.mean),
        format_rate(s.stddev),
        format_rate(s.min),
        format_rate(s.max),
    ));

    if !receipt.verdict.reasons.is_empty() {
        out.push_str("\n**Notes:**\n");
        for r in &receipt.verdict.reasons {
            out.push_str(&format!("- {}\n", r));
        }
    }

    out
}

pub fn github_annotations(receipt: &CheckReceipt) -> Vec<String> {
    let prefix = match receipt.verdict.status {
        VerdictStatus::Fail => "::error",
        VerdictStatus::Pass => "::notice",
    };

    let relation = match receipt.verdict.status {
        VerdictStatus::Fail => "not above",
        VerdictStatus::Pass => "above",
    };

    vec![format!(
        "{prefix}::tgate {input}: {agg} throughput {v} is {relation} threshold {t}",
        input = receipt.input.path,
        agg = receipt.policy.aggregate,
        v = format_rate(receipt.metric),
        t = format_rate(receipt.policy.threshold),
    )]
}

fn format_rate(v: f64) -> String {
    format!("{:.0} events/s", v)
}
