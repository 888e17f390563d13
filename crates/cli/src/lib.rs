pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use winloss_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use commands::analyze::AnalyzeArgs;
use commands::personas::PersonasArgs;
use commands::{CommandResult, EXIT_CONFIG_VALIDATION};

#[derive(Debug, Parser)]
#[command(
    name = "winloss",
    about = "Deal outcome analytics CLI",
    long_about = "Mine win patterns, loss reasons, ideal customer profiles, qualification thresholds, and buyer personas from closed deals.",
    after_help = "Examples:\n  winloss analyze --input deals.json\n  winloss personas --input deals.json --min-occurrences 2\n  winloss config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Config file (defaults to winloss.toml or config/winloss.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level override (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Log format override (compact|pretty|json)")]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Analyze win/loss patterns, ICP, and the qualification threshold")]
    Analyze(AnalyzeArgs),
    #[command(about = "Extract buyer personas and decision-maker patterns from won deals")]
    Personas(PersonasArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Analyze(_) => "analyze",
            Self::Personas(_) => "personas",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub fn execute(cli: Cli) -> CommandResult {
    let command = cli.command.name();

    let log_format = match cli.log_format.as_deref().map(str::parse::<LogFormat>).transpose() {
        Ok(format) => format,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG_VALIDATION,
            );
        }
    };
    let overrides = ConfigOverrides { log_level: cli.log_level, log_format, ..Default::default() };
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config.clone(),
        overrides: overrides.clone(),
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG_VALIDATION,
            );
        }
    };
    init_logging(&config);

    match cli.command {
        Command::Analyze(args) => commands::analyze::run(&config, &args),
        Command::Personas(args) => commands::personas::run(&config, &args),
        Command::Config => CommandResult::success(
            command,
            commands::config::run(&config, cli.config.as_deref(), &overrides),
        ),
    }
}

/// Logs go to stderr so stdout stays a single JSON document. `RUST_LOG` wins over config.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    // A subscriber may already be installed when commands run in-process.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
