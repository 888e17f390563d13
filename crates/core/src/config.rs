use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::bucketing::Dimension;

pub const DEFAULT_MIN_DEALS_FOR_PATTERN: usize = 3;
pub const DEFAULT_MIN_OCCURRENCES: usize = 3;
pub const DEFAULT_THRESHOLD_CANDIDATES: [f64; 5] = [0.5, 0.6, 0.7, 0.8, 0.9];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub min_deals_for_pattern: usize,
    pub min_occurrences: usize,
    pub time_period_days: Option<u32>,
    pub dimensions: Vec<Dimension>,
    pub threshold_candidates: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_deals_for_pattern: DEFAULT_MIN_DEALS_FOR_PATTERN,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            time_period_days: None,
            dimensions: vec![Dimension::Industry, Dimension::RevenueRange],
            threshold_candidates: DEFAULT_THRESHOLD_CANDIDATES.to_vec(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("winloss.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(min_deals_for_pattern) = analysis.min_deals_for_pattern {
                self.analysis.min_deals_for_pattern = min_deals_for_pattern;
            }
            if let Some(min_occurrences) = analysis.min_occurrences {
                self.analysis.min_occurrences = min_occurrences;
            }
            if let Some(time_period_days) = analysis.time_period_days {
                self.analysis.time_period_days = Some(time_period_days);
            }
            if let Some(dimensions) = analysis.dimensions {
                self.analysis.dimensions = dimensions;
            }
            if let Some(threshold_candidates) = analysis.threshold_candidates {
                self.analysis.threshold_candidates = threshold_candidates;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WINLOSS_MIN_DEALS_FOR_PATTERN") {
            self.analysis.min_deals_for_pattern =
                parse_usize("WINLOSS_MIN_DEALS_FOR_PATTERN", &value)?;
        }
        if let Some(value) = read_env("WINLOSS_MIN_OCCURRENCES") {
            self.analysis.min_occurrences = parse_usize("WINLOSS_MIN_OCCURRENCES", &value)?;
        }
        if let Some(value) = read_env("WINLOSS_TIME_PERIOD_DAYS") {
            self.analysis.time_period_days = Some(parse_u32("WINLOSS_TIME_PERIOD_DAYS", &value)?);
        }
        if let Some(value) = read_env("WINLOSS_DIMENSIONS") {
            self.analysis.dimensions = parse_list("WINLOSS_DIMENSIONS", &value, |item| {
                item.parse::<Dimension>().ok()
            })?;
        }
        if let Some(value) = read_env("WINLOSS_THRESHOLD_CANDIDATES") {
            self.analysis.threshold_candidates =
                parse_list("WINLOSS_THRESHOLD_CANDIDATES", &value, |item| {
                    item.parse::<f64>().ok()
                })?;
        }

        let log_level = read_env("WINLOSS_LOGGING_LEVEL").or_else(|| read_env("WINLOSS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WINLOSS_LOGGING_FORMAT").or_else(|| read_env("WINLOSS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_deals_for_pattern == 0 {
            return Err(ConfigError::Validation(
                "analysis.min_deals_for_pattern must be greater than zero".to_string(),
            ));
        }

        if self.min_occurrences == 0 {
            return Err(ConfigError::Validation(
                "analysis.min_occurrences must be greater than zero".to_string(),
            ));
        }

        if self.time_period_days == Some(0) {
            return Err(ConfigError::Validation(
                "analysis.time_period_days must be greater than zero when set".to_string(),
            ));
        }

        if self.dimensions.is_empty() {
            return Err(ConfigError::Validation(
                "analysis.dimensions must name at least one dimension".to_string(),
            ));
        }
        for (idx, dimension) in self.dimensions.iter().enumerate() {
            if self.dimensions[..idx].contains(dimension) {
                return Err(ConfigError::Validation(format!(
                    "analysis.dimensions lists `{}` more than once",
                    dimension.as_str()
                )));
            }
        }

        if self.threshold_candidates.is_empty() {
            return Err(ConfigError::Validation(
                "analysis.threshold_candidates must contain at least one value".to_string(),
            ));
        }
        if let Some(bad) = self
            .threshold_candidates
            .iter()
            .find(|value| !value.is_finite() || **value < 0.0 || **value > 1.0)
        {
            return Err(ConfigError::Validation(format!(
                "analysis.threshold_candidates values must be in range 0.0..=1.0 (got {bad})"
            )));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("winloss.toml"), PathBuf::from("config/winloss.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_list<T>(
    key: &str,
    value: &str,
    parse_item: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            parse_item(item).ok_or_else(|| ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    min_deals_for_pattern: Option<usize>,
    min_occurrences: Option<usize>,
    time_period_days: Option<u32>,
    dimensions: Option<Vec<Dimension>>,
    threshold_candidates: Option<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
