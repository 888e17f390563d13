use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use winloss_core::config::{AppConfig, ConfigOverrides, LogFormat};

/// One reported config key and every place its value may come from, highest precedence first.
struct FieldSpec {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    flag: Option<&'static str>,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key_path: "analysis.min_deals_for_pattern",
        env_keys: &["WINLOSS_MIN_DEALS_FOR_PATTERN"],
        flag: None,
    },
    FieldSpec {
        key_path: "analysis.min_occurrences",
        env_keys: &["WINLOSS_MIN_OCCURRENCES"],
        flag: None,
    },
    FieldSpec {
        key_path: "analysis.time_period_days",
        env_keys: &["WINLOSS_TIME_PERIOD_DAYS"],
        flag: None,
    },
    FieldSpec { key_path: "analysis.dimensions", env_keys: &["WINLOSS_DIMENSIONS"], flag: None },
    FieldSpec {
        key_path: "analysis.threshold_candidates",
        env_keys: &["WINLOSS_THRESHOLD_CANDIDATES"],
        flag: None,
    },
    FieldSpec {
        key_path: "logging.level",
        env_keys: &["WINLOSS_LOGGING_LEVEL", "WINLOSS_LOG_LEVEL"],
        flag: Some("--log-level"),
    },
    FieldSpec {
        key_path: "logging.format",
        env_keys: &["WINLOSS_LOGGING_FORMAT", "WINLOSS_LOG_FORMAT"],
        flag: Some("--log-format"),
    },
];

/// Renders the effective configuration with the source of every value.
pub fn run(config: &AppConfig, config_path: Option<&Path>, overrides: &ConfigOverrides) -> String {
    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    for field in FIELDS {
        let flag_set = match field.key_path {
            "logging.level" => overrides.log_level.is_some(),
            "logging.format" => overrides.log_format.is_some(),
            _ => false,
        };
        let source = if flag_set {
            format!("flag ({})", field.flag.unwrap_or("command line"))
        } else {
            field_source(field, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(field.key_path, &render_value(config, field.key_path), source));
    }

    lines.join("\n")
}

fn render_value(config: &AppConfig, key_path: &str) -> String {
    let analysis = &config.analysis;
    match key_path {
        "analysis.min_deals_for_pattern" => analysis.min_deals_for_pattern.to_string(),
        "analysis.min_occurrences" => analysis.min_occurrences.to_string(),
        "analysis.time_period_days" => analysis
            .time_period_days
            .map_or_else(|| "<unset>".to_string(), |days| days.to_string()),
        "analysis.dimensions" => analysis
            .dimensions
            .iter()
            .map(|dimension| dimension.as_str())
            .collect::<Vec<_>>()
            .join(","),
        "analysis.threshold_candidates" => analysis
            .threshold_candidates
            .iter()
            .map(|threshold| threshold.to_string())
            .collect::<Vec<_>>()
            .join(","),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => match config.logging.format {
            LogFormat::Compact => "compact".to_string(),
            LogFormat::Pretty => "pretty".to_string(),
            LogFormat::Json => "json".to_string(),
        },
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("winloss.toml"), PathBuf::from("config/winloss.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &FieldSpec,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn nested_key_paths_are_resolved() {
        let doc: Value = "[analysis]\nmin_occurrences = 4\n".parse().expect("valid toml");
        assert!(contains_path(&doc, "analysis.min_occurrences"));
        assert!(!contains_path(&doc, "analysis.dimensions"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
