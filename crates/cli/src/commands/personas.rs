use std::path::PathBuf;

use clap::Args;
use uuid::Uuid;
use winloss_core::analytics::{PersonaRequest, WinLossAnalyzer};
use winloss_core::config::AppConfig;

use super::input::load_deals;
use super::CommandResult;

const COMMAND: &str = "personas";

#[derive(Debug, Clone, Args)]
pub struct PersonasArgs {
    #[arg(long, help = "Deal batch as JSON; `-` reads stdin")]
    pub input: PathBuf,
    #[arg(long, help = "Minimum won-deal appearances before a title becomes a persona")]
    pub min_occurrences: Option<usize>,
    #[arg(long, help = "Correlation id attached to logs and output; generated when omitted")]
    pub correlation_id: Option<String>,
}

pub fn run(config: &AppConfig, args: &PersonasArgs) -> CommandResult {
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
    let request = PersonaRequest {
        min_occurrences: args.min_occurrences,
        correlation_id: Some(correlation_id.clone()),
    };

    match analyzer.extract_buyer_personas(&batch.deals, &request) {
        Ok(result) => {
            let message = format!("extracted {} buyer personas", result.personas.len());
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
