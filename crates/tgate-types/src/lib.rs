//! Shared types for tgate.
//!
//! Design goal: versioned, explicit, boring.
//! These structs are used for check receipts, PR comments, and the optional config file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tgate_error::ConfigError;

pub const CHECK_SCHEMA_V1: &str = "tgate.check.v1";

/// Benchmark results file read when no input is given.
pub const DEFAULT_INPUT_FILE: &str = "thready-performance-benchmark.csv";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "tgate.toml";

/// Column holding the number of events a benchmark trial processed.
pub const EVENTS_COLUMN: &str = "Stdout";

/// Column holding the wall time of a benchmark trial, in seconds.
pub const RUNTIME_COLUMN: &str = "JobRuntime";

/// Minimum mean throughput (events/second) of the baseline build.
pub const EVENTS_PER_SEC: f64 = 8.36e6;

/// Minimum mean + stddev throughput (events/second) of the optimized build.
pub const EVENTS_PER_SEC_OPT: f64 = 9.6e6;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// One data row of the benchmark results file.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BenchmarkRecord {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub events: f64,
    pub runtime_s: f64,
}

/// How throughput samples are reduced to the single compared value.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean,
    #[default]
    MeanPlusStddev,
}

impl Aggregate {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Mean => "mean",
            Aggregate::MeanPlusStddev => "mean_plus_stddev",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "mean" => Ok(Aggregate::Mean),
            "mean_plus_stddev" => Ok(Aggregate::MeanPlusStddev),
            _ => Err(ConfigError::UnknownAggregate(s.to_string())),
        }
    }
}

/// Named threshold/aggregate pairs for the two builds the gate has guarded.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Mean throughput must exceed [`EVENTS_PER_SEC`].
    Baseline,
    /// Mean + stddev throughput must exceed [`EVENTS_PER_SEC_OPT`].
    #[default]
    Optimized,
}

impl Preset {
    pub fn threshold(self) -> f64 {
        match self {
            Preset::Baseline => EVENTS_PER_SEC,
            Preset::Optimized => EVENTS_PER_SEC_OPT,
        }
    }

    pub fn aggregate(self) -> Aggregate {
        match self {
            Preset::Baseline => Aggregate::Mean,
            Preset::Optimized => Aggregate::MeanPlusStddev,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Baseline => "baseline",
            Preset::Optimized => "optimized",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "baseline" => Ok(Preset::Baseline),
            "optimized" => Ok(Preset::Optimized),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ColumnSpec {
    pub events: String,
    pub runtime: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            events: EVENTS_COLUMN.to_string(),
            runtime: RUNTIME_COLUMN.to_string(),
        }
    }
}

/// Fully resolved parameters of one check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CheckPolicy {
    /// Minimum acceptable aggregate, events/second. The check passes only when
    /// the aggregate is strictly greater.
    pub threshold: f64,

    pub aggregate: Aggregate,

    pub columns: ColumnSpec,
}

impl CheckPolicy {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            threshold: preset.threshold(),
            aggregate: preset.aggregate(),
            columns: ColumnSpec::default(),
        }
    }
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ThroughputSummary {
    pub count: usize,
    pub mean: f64,

    /// Population standard deviation (divisor N).
    pub stddev: f64,

    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunMeta {
    pub started_at: String,
    pub ended_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InputMeta {
    /// Path of the benchmark file as given (stringified).
    pub path: String,

    /// Number of data rows read.
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CheckReceipt {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunMeta,
    pub input: InputMeta,
    pub policy: CheckPolicy,
    pub summary: ThroughputSummary,

    /// The aggregate compared against `policy.threshold`, events/second.
    pub metric: f64,

    pub verdict: Verdict,
}

// ----------------------------
// Optional config file schema
// ----------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Benchmark results file, relative to the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    /// Overrides the preset threshold (events/second).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Overrides the preset aggregate strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_column: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_column: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_both_observed_thresholds() {
        assert_eq!(Preset::Baseline.threshold(), 8.36e6);
        assert_eq!(Preset::Baseline.aggregate(), Aggregate::Mean);
        assert_eq!(Preset::Optimized.threshold(), 9.6e6);
        assert_eq!(Preset::Optimized.aggregate(), Aggregate::MeanPlusStddev);
        assert_eq!(CheckPolicy::default().threshold, EVENTS_PER_SEC_OPT);
    }

    #[test]
    fn aggregate_parses_dashed_and_snake_case() {
        assert_eq!(
            "mean-plus-stddev".parse::<Aggregate>().unwrap(),
            Aggregate::MeanPlusStddev
        );
        assert_eq!(
            "mean_plus_stddev".parse::<Aggregate>().unwrap(),
            Aggregate::MeanPlusStddev
        );
        assert_eq!("mean".parse::<Aggregate>().unwrap(), Aggregate::Mean);
        assert!(matches!(
            "median".parse::<Aggregate>(),
            Err(ConfigError::UnknownAggregate(s)) if s == "median"
        ));
    }

    #[test]
    fn preset_rejects_unknown_names() {
        assert!(matches!(
            "fast".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn aggregate_serde_keys_are_snake_case() {
        let json = serde_json::to_string(&Aggregate::MeanPlusStddev).unwrap();
        assert_eq!(json, "\"mean_plus_stddev\"");
    }

    #[test]
    fn config_file_parses_check_table() {
        let cfg: ConfigFile = toml::from_str(
            r#"
[check]
preset = "baseline"
threshold = 9.0e6
aggregate = "mean"
events_column = "events"
"#,
        )
        .unwrap();
        assert_eq!(cfg.check.preset, Some(Preset::Baseline));
        assert_eq!(cfg.check.threshold, Some(9.0e6));
        assert_eq!(cfg.check.aggregate, Some(Aggregate::Mean));
        assert_eq!(cfg.check.events_column.as_deref(), Some("events"));
        assert_eq!(cfg.check.runtime_column, None);
    }

    #[test]
    fn config_file_rejects_unknown_keys() {
        let err = toml::from_str::<ConfigFile>("[check]\nthreshhold = 1.0\n");
        assert!(err.is_err());
    }

    #[test]
    fn empty_config_is_default() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }
}
