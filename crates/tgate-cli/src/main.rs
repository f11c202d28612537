use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tgate_app::{
    CheckRequest, CheckUseCase, SystemClock, github_annotations, render_markdown,
    render_metric_line,
};
use tgate_config::{CheckOverrides, discover_config, resolve_check};
use tgate_ingest::read_benchmark_csv;
use tgate_types::{Aggregate, CheckReceipt, ConfigFile, Preset, ToolInfo};
use tracing_subscriber::EnvFilter;

/// Aggregate throughput did not exceed the threshold.
const EXIT_FAIL: u8 = 2;

/// Input, config, or I/O problem; no verdict was reached.
const EXIT_TOOL_ERROR: u8 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "tgate",
    version,
    about = "Throughput regression gate for benchmark result tables"
)]
struct Cli {
    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute aggregate throughput from a benchmark CSV and fail at or below the threshold.
    Check {
        /// Benchmark results CSV [default: thready-performance-benchmark.csv]
        #[arg(long)]
        input: Option<PathBuf>,

        /// Config file [default: tgate.toml in the working directory, if present]
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named threshold/aggregate pair: baseline | optimized
        #[arg(long, value_parser = parse_preset)]
        preset: Option<Preset>,

        /// Minimum aggregate throughput, events/second (e.g. 9.6e6)
        #[arg(long)]
        threshold: Option<f64>,

        /// Aggregate strategy: mean | mean-plus-stddev
        #[arg(long, value_parser = parse_aggregate)]
        aggregate: Option<Aggregate>,

        /// Column holding the event count
        #[arg(long)]
        events_column: Option<String>,

        /// Column holding the runtime in seconds
        #[arg(long)]
        runtime_column: Option<String>,

        /// Write the check receipt (JSON) to this path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pretty-print JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Write a Markdown summary to this path
        #[arg(long)]
        md: Option<PathBuf>,

        /// Also emit a GitHub Actions annotation line
        #[arg(long, default_value_t = false)]
        github_annotations: bool,
    },

    /// Render a Markdown summary from a check receipt.
    Md {
        #[arg(long)]
        receipt: PathBuf,

        /// Output markdown path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Emit GitHub Actions annotations from a check receipt.
    GithubAnnotations {
        #[arg(long)]
        receipt: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match real_main(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let kind = tgate_error::classify(err.chain())
                .map(|k| k.as_str())
                .unwrap_or("other");
            tracing::debug!(kind, "aborted");
            eprintln!("{err:#}");
            ExitCode::from(EXIT_TOOL_ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the metric line only
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn real_main(cli: Cli) -> anyhow::Result<u8> {
    match cli.cmd {
        Command::Check {
            input,
            config,
            preset,
            threshold,
            aggregate,
            events_column,
            runtime_column,
            out,
            pretty,
            md,
            github_annotations: annotate,
        } => {
            let cwd = std::env::current_dir().context("resolve working directory")?;
            let (config_path, config_file) = match discover_config(config.as_deref(), &cwd)? {
                Some((path, file)) => (Some(path), file),
                None => (None, ConfigFile::default()),
            };

            let resolved = resolve_check(
                &config_file.check,
                &CheckOverrides {
                    input,
                    preset,
                    threshold,
                    aggregate,
                    events_column,
                    runtime_column,
                },
            )?;

            tracing::debug!(
                config = ?config_path,
                input = %resolved.input.display(),
                preset = %resolved.preset,
                threshold = resolved.policy.threshold,
                aggregate = %resolved.policy.aggregate,
                "resolved check"
            );

            let records = read_benchmark_csv(&resolved.input, &resolved.policy.columns)?;

            let outcome = CheckUseCase::new(SystemClock).execute(CheckRequest {
                input_path: resolved.input,
                records,
                policy: resolved.policy,
                tool: tool_info(),
            })?;

            println!("{}", render_metric_line(&outcome.receipt));

            if let Some(path) = out {
                write_json(&path, &outcome.receipt, pretty)?;
            }

            if let Some(path) = md {
                write_text(&path, &render_markdown(&outcome.receipt))?;
            }

            if annotate {
                for line in github_annotations(&outcome.receipt) {
                    println!("{line}");
                }
            }

            if outcome.failed {
                for reason in &outcome.receipt.verdict.reasons {
                    eprintln!("tgate: fail: {reason}");
                }
                return Ok(EXIT_FAIL);
            }

            Ok(0)
        }

        Command::Md { receipt, out } => {
            let receipt: CheckReceipt = read_json(&receipt)?;
            let md = render_markdown(&receipt);

            match out {
                Some(path) => write_text(&path, &md)?,
                None => print!("{md}"),
            }

            Ok(0)
        }

        Command::GithubAnnotations { receipt } => {
            let receipt: CheckReceipt = read_json(&receipt)?;
            for line in github_annotations(&receipt) {
                println!("{line}");
            }
            Ok(0)
        }
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "tgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn parse_preset(s: &str) -> Result<Preset, String> {
    s.parse().map_err(|e: tgate_error::ConfigError| e.to_string())
}

fn parse_aggregate(s: &str) -> Result<Aggregate, String> {
    s.parse().map_err(|e: tgate_error::ConfigError| e.to_string())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let v =
        serde_json::from_slice(&bytes).with_context(|| format!("parse json {}", path.display()))?;
    Ok(v)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, pretty: bool) -> anyhow::Result<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    atomic_write(path, &bytes)
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    atomic_write(path, text.as_bytes())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => {
            fs::create_dir_all(p).with_context(|| format!("create dir {}", p.display()))?;
            p
        }
        _ => Path::new("."),
    };

    let mut tmp = parent.to_path_buf();
    tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4()));

    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create temp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_overrides() {
        let cli = Cli::try_parse_from([
            "tgate",
            "check",
            "--preset",
            "baseline",
            "--aggregate",
            "mean-plus-stddev",
            "--threshold",
            "9.6e6",
        ])
        .unwrap();

        match cli.cmd {
            Command::Check {
                preset,
                aggregate,
                threshold,
                input,
                ..
            } => {
                assert_eq!(preset, Some(Preset::Baseline));
                assert_eq!(aggregate, Some(Aggregate::MeanPlusStddev));
                assert_eq!(threshold, Some(9.6e6));
                assert_eq!(input, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_aggregate() {
        let err = Cli::try_parse_from(["tgate", "check", "--aggregate", "median"]).unwrap_err();
        assert!(err.to_string().contains("unknown aggregate strategy"));
    }

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("receipt.json");
        write_json(&path, &serde_json::json!({"ok": true}), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"ok":true}"#);
    }
}
