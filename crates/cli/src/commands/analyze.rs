use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use uuid::Uuid;
use winloss_core::analytics::{AnalysisRequest, WinLossAnalyzer};
use winloss_core::config::AppConfig;

use super::input::load_deals;
use super::CommandResult;

const COMMAND: &str = "analyze";

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[arg(long, help = "Deal batch as JSON; `-` reads stdin")]
    pub input: PathBuf,
    #[arg(long = "min-deals", help = "Minimum deals a bucket needs before it is reported")]
    pub min_deals_for_pattern: Option<usize>,
    #[arg(long = "period-days", help = "Only analyze deals closed within this many days")]
    pub time_period_days: Option<u32>,
    #[arg(long = "as-of", help = "End of the recency window (RFC 3339); defaults to now")]
    pub as_of: Option<DateTime<Utc>>,
    #[arg(long, help = "Correlation id attached to logs and output; generated when omitted")]
    pub correlation_id: Option<String>,
}

pub fn run(config: &AppConfig, args: &AnalyzeArgs) -> CommandResult {
    let correlation_id =
        args.correlation_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    let batch = match load_deals(&args.input) {
        Ok(batch) => batch,
        Err(error) => return error.into_result(COMMAND),
    };
    tracing::debug!(
        event_name = "cli.input.loaded",
        correlation_id = %correlation_id,
        command = COMMAND,
        deals = batch.deals.len(),
        skipped = batch.skipped.len(),
        "deal batch loaded"
    );

    let analyzer = WinLossAnalyzer::new(config.analysis.clone());
    let request = AnalysisRequest {
        min_deals_for_pattern: args.min_deals_for_pattern,
        time_period_days: args.time_period_days,
        as_of: args.as_of,
        correlation_id: Some(correlation_id.clone()),
    };

    match analyzer.analyze_win_loss_patterns(&batch.deals, &request) {
        Ok(result) => {
            let message = format!(
                "analyzed {} deals: {} win patterns, {} loss patterns, optimal threshold {:.1}",
                result.summary.total_deals,
                result.win_patterns.len(),
                result.loss_patterns.len(),
                result.qualification_insights.optimal_threshold
            );
            CommandResult::report(COMMAND, message, &correlation_id, &result, &batch.skipped)
        }
        Err(error) => CommandResult::analysis_failure(
            COMMAND,
            batch.account_skipped(error),
            &correlation_id,
            &batch.skipped,
        ),
    }
}
