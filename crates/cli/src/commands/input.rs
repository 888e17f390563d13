use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use winloss_core::domain::deal::DealRecord;
use winloss_core::errors::AnalysisError;

use super::{CommandResult, EXIT_INPUT_PARSE, EXIT_INPUT_READ};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read deal batch `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse deal batch `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("deal batch `{path}` must be a JSON array or an object with a `deals` array")]
    Shape { path: PathBuf },
}

impl InputError {
    pub fn into_result(self, command: &str) -> CommandResult {
        match self {
            Self::Read { .. } => {
                CommandResult::failure(command, "input_read", self.to_string(), EXIT_INPUT_READ)
            }
            Self::Parse { .. } | Self::Shape { .. } => {
                CommandResult::failure(command, "input_parse", self.to_string(), EXIT_INPUT_PARSE)
            }
        }
    }
}

/// A record that could not be decoded into a [`DealRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub deal_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct DealBatch {
    pub deals: Vec<DealRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl DealBatch {
    /// Counts undecodable records as rejections. A batch where nothing decoded is reported as
    /// having no valid records rather than as empty.
    pub fn account_skipped(&self, error: AnalysisError) -> AnalysisError {
        match error {
            AnalysisError::EmptyBatch if !self.skipped.is_empty() => {
                AnalysisError::NoValidRecords { rejected: self.skipped.len() }
            }
            AnalysisError::NoValidRecords { rejected } => {
                AnalysisError::NoValidRecords { rejected: rejected + self.skipped.len() }
            }
            other => other,
        }
    }
}

/// Reads a deal batch from `path`, or from stdin when `path` is `-`.
pub fn load_deals(path: &Path) -> Result<DealBatch, InputError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| InputError::Read { path: path.to_path_buf(), source })?;
        buffer
    } else {
        fs::read_to_string(path)
            .map_err(|source| InputError::Read { path: path.to_path_buf(), source })?
    };

    parse_deals(&raw, path)
}

/// Accepts either a bare array of deals or `{"deals": [...]}`. Each element is decoded on its
/// own; elements that do not decode are skipped and reported.
pub fn parse_deals(raw: &str, path: &Path) -> Result<DealBatch, InputError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|source| InputError::Parse { path: path.to_path_buf(), source })?;
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("deals") {
            Some(Value::Array(items)) => items,
            _ => return Err(InputError::Shape { path: path.to_path_buf() }),
        },
        _ => return Err(InputError::Shape { path: path.to_path_buf() }),
    };

    let mut batch = DealBatch::default();
    for (index, item) in items.into_iter().enumerate() {
        let deal_id = item.get("deal_id").and_then(Value::as_str).map(str::to_string);
        match serde_json::from_value::<DealRecord>(item) {
            Ok(deal) => batch.deals.push(deal),
            Err(error) => {
                tracing::warn!(
                    event_name = "cli.input.record_skipped",
                    index,
                    deal_id = deal_id.as_deref().unwrap_or(""),
                    error = %error,
                    "deal record could not be decoded"
                );
                batch.skipped.push(SkippedRecord { index, deal_id, reason: error.to_string() });
            }
        }
    }
    Ok(batch)
}
