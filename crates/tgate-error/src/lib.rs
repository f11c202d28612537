//! Unified error types for tgate.
//!
//! Every failure of the gate is fatal. The variants exist so the message names
//! the file, row, or column at fault, and so the binary can tell an input
//! problem apart from a configuration problem in its logs.

use std::path::PathBuf;

/// Coarse classification used for log fields and diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Schema,
    Parse,
    EmptyInput,
    InvalidSample,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::Schema => "schema",
            ErrorKind::Parse => "parse",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::InvalidSample => "invalid_sample",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while reading the benchmark results file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("input has no header row")]
    MissingHeader,

    #[error("missing required column `{column}` (header: {header})")]
    MissingColumn { column: String, header: String },

    #[error("row {row}: expected at least {expected} fields, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column `{column}`: cannot parse {value:?} as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Io { .. } => ErrorKind::Io,
            IngestError::MissingHeader
            | IngestError::MissingColumn { .. }
            | IngestError::ShortRow { .. } => ErrorKind::Schema,
            IngestError::InvalidNumber { .. } | IngestError::UnterminatedQuote { .. } => {
                ErrorKind::Parse
            }
        }
    }
}

/// Errors raised by the I/O-free throughput math.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("no benchmark rows to aggregate")]
    NoSamples,

    #[error("row {row}: runtime must be > 0 seconds (got {runtime})")]
    NonPositiveRuntime { row: usize, runtime: f64 },

    #[error("row {row}: throughput sample is not finite ({events} events / {runtime} s)")]
    NonFiniteSample {
        row: usize,
        events: f64,
        runtime: f64,
    },

    #[error("aggregate throughput is not finite (mean {mean}, stddev {stddev})")]
    NonFiniteAggregate { mean: f64, stddev: f64 },
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NoSamples => ErrorKind::EmptyInput,
            DomainError::NonPositiveRuntime { .. }
            | DomainError::NonFiniteSample { .. }
            | DomainError::NonFiniteAggregate { .. } => ErrorKind::InvalidSample,
        }
    }
}

/// Errors raised while loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("threshold must be a finite number > 0 (got {0})")]
    InvalidThreshold(f64),

    #[error("{0} column name must not be empty")]
    EmptyColumn(&'static str),

    #[error("unknown aggregate strategy `{0}` (expected mean|mean_plus_stddev)")]
    UnknownAggregate(String),

    #[error("unknown preset `{0}` (expected baseline|optimized)")]
    UnknownPreset(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}

/// Find the most specific tgate error in an error chain.
///
/// Works on anything exposing `std::error::Error`, including the sources of an
/// `anyhow::Error` (pass `err.chain()`).
pub fn classify<'a, I>(chain: I) -> Option<ErrorKind>
where
    I: IntoIterator<Item = &'a (dyn std::error::Error + 'static)>,
{
    chain.into_iter().find_map(|e| {
        if let Some(e) = e.downcast_ref::<IngestError>() {
            Some(e.kind())
        } else if let Some(e) = e.downcast_ref::<DomainError>() {
            Some(e.kind())
        } else {
            e.downcast_ref::<ConfigError>().map(ConfigError::kind)
        }
    })
}
