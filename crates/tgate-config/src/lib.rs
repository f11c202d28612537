//! Configuration loading and merging for tgate.
//!
//! Values are layered: built-in defaults, then the config file, then command
//! line overrides. Within a layer a preset is applied first and explicit
//! `threshold`/`aggregate` values override it.

use std::fs;
use std::path::{Path, PathBuf};
use tgate_error::ConfigError;
use tgate_types::{
    Aggregate, CheckConfig, CheckPolicy, ConfigFile, DEFAULT_CONFIG_FILE, DEFAULT_INPUT_FILE,
    Preset,
};

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOverrides {
    pub input: Option<PathBuf>,
    pub preset: Option<Preset>,
    pub threshold: Option<f64>,
    pub aggregate: Option<Aggregate>,
    pub events_column: Option<String>,
    pub runtime_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCheck {
    pub input: PathBuf,

    /// Preset the policy started from (for logs; explicit values may override it).
    pub preset: Preset,

    pub policy: CheckPolicy,
}

pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the explicit config if given, else `tgate.toml` in `cwd` if it exists.
pub fn discover_config(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<Option<(PathBuf, ConfigFile)>, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(None);
            }
            candidate
        }
    };

    let config = load_config(&path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(Some((path, config)))
}

struct Layer<'a> {
    preset: Option<Preset>,
    threshold: Option<f64>,
    aggregate: Option<Aggregate>,
    events_column: Option<&'a str>,
    runtime_column: Option<&'a str>,
}

impl Layer<'_> {
    fn apply(&self, policy: &mut CheckPolicy) {
        if let Some(preset) = self.preset {
            policy.threshold = preset.threshold();
            policy.aggregate = preset.aggregate();
        }
        if let Some(threshold) = self.threshold {
            policy.threshold = threshold;
        }
        if let Some(aggregate) = self.aggregate {
            policy.aggregate = aggregate;
        }
        if let Some(events) = self.events_column {
            policy.columns.events = events.trim().to_string();
        }
        if let Some(runtime) = self.runtime_column {
            policy.columns.runtime = runtime.trim().to_string();
        }
    }
}

/// Merge config file values and overrides into one validated check.
pub fn resolve_check(
    config: &CheckConfig,
    overrides: &CheckOverrides,
) -> Result<ResolvedCheck, ConfigError> {
    let mut policy = CheckPolicy::default();

    Layer {
        preset: config.preset,
        threshold: config.threshold,
        aggregate: config.aggregate,
        events_column: config.events_column.as_deref(),
        runtime_column: config.runtime_column.as_deref(),
    }
    .apply(&mut policy);

    Layer {
        preset: overrides.preset,
        threshold: overrides.threshold,
        aggregate: overrides.aggregate,
        events_column: overrides.events_column.as_deref(),
        runtime_column: overrides.runtime_column.as_deref(),
    }
    .apply(&mut policy);

    validate_policy(&policy)?;

    let input = overrides
        .input
        .clone()
        .or_else(|| config.input.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE));

    Ok(ResolvedCheck {
        input,
        preset: overrides.preset.or(config.preset).unwrap_or_default(),
        policy,
    })
}

pub fn validate_policy(policy: &CheckPolicy) -> Result<(), ConfigError> {
    if !policy.threshold.is_finite() || policy.threshold <= 0.0 {
        return Err(ConfigError::InvalidThreshold(policy.threshold));
    }
    if policy.columns.events.is_empty() {
        return Err(ConfigError::EmptyColumn("events"));
    }
    if policy.columns.runtime.is_empty() {
        return Err(ConfigError::EmptyColumn("runtime"));
    }
    Ok(())
}
