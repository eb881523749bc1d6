//! CLI definitions and entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use super::commands;
use descil_mturk::output::{ErrorOutput, OutputMode};
use descil_mturk::{Descil, ServiceConfig};

/// descil - Access-code client for MTurk experiments
#[derive(Parser, Debug)]
#[command(
    name = "descil",
    version,
    about = "Access-code client for MTurk experiments",
    long_about = "Authenticate MTurk workers against the Descil service.\n\n\
                  Access codes are fetched per project; check-in, check-out and\n\
                  drop-out events are reported back with exit codes and bonuses."
)]
pub struct Cli {
    /// Config file (default: $DESCIL_CONFIG, then ~/.config/descil/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the loaded configuration
    Config,

    /// Check that the service answers (HelloWorld)
    Ping,

    /// Fetch the project's access codes and list them
    Codes,

    /// Check a worker in
    CheckIn {
        /// Access code of the worker
        access_code: String,
    },

    /// Check a worker out after completing the task
    CheckOut {
        /// Access code of the worker
        access_code: String,

        /// Exit code handed to the worker
        exit_code: String,

        /// Bonus to pay
        #[arg(short, long, default_value_t = 0.0)]
        bonus: f64,
    },

    /// Mark a worker as dropped out
    DropOut {
        /// Access code of the worker
        access_code: String,

        /// Exit code handed to the worker
        exit_code: String,

        /// Bonus to pay
        #[arg(short, long, default_value_t = 0.0)]
        bonus: f64,
    },

    /// Post session results from a JSON file in one request
    PostCodes {
        /// JSON array of {"AccessCode", "ExitCode", "Bonus"} objects
        file: PathBuf,
    },

    /// Fetch payoff records
    Payoffs,

    /// Show version
    Version,
}

/// Run the CLI
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match execute(cli.command, cli.config.as_deref(), output_mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, output_mode);
            ExitCode::FAILURE
        },
    }
}

async fn execute(
    command: Option<Command>,
    config: Option<&Path>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let command = match command {
        Some(Command::Version) => {
            print_version(output_mode, None);
            return Ok(());
        },
        None => {
            print_version(output_mode, Some("Use --help for usage"));
            return Ok(());
        },
        Some(command) => command,
    };

    let path = ServiceConfig::resolve_path(config);
    let config = ServiceConfig::load(&path)?;

    if matches!(command, Command::Config) {
        commands::show_config(&path, &config, output_mode);
        return Ok(());
    }

    let descil = Descil::new(config)?;
    match command {
        Command::Ping => commands::ping(&descil, output_mode).await,
        Command::Codes => commands::codes(&descil, output_mode).await,
        Command::CheckIn { access_code } => {
            commands::check_in(&descil, &access_code, output_mode).await
        },
        Command::CheckOut {
            access_code,
            exit_code,
            bonus,
        } => commands::check_out(&descil, &access_code, &exit_code, bonus, output_mode).await,
        Command::DropOut {
            access_code,
            exit_code,
            bonus,
        } => commands::drop_out(&descil, &access_code, &exit_code, bonus, output_mode).await,
        Command::PostCodes { file } => commands::post_codes(&descil, &file, output_mode).await,
        Command::Payoffs => commands::payoffs(&descil, output_mode).await,
        Command::Config | Command::Version => Ok(()),
    }
}

fn print_version(output_mode: OutputMode, hint: Option<&str>) {
    if output_mode == OutputMode::Json {
        let mut json = serde_json::json!({ "version": env!("CARGO_PKG_VERSION") });
        if let Some(hint) = hint {
            json["hint"] = serde_json::Value::from(hint);
        }
        println!("{json}");
    } else {
        println!("descil v{}", env!("CARGO_PKG_VERSION"));
        if hint.is_some() {
            println!("\nRun 'descil --help' for usage");
            println!("Run 'descil codes' to fetch the project's access codes");
        }
    }
}

fn report(err: &anyhow::Error, output_mode: OutputMode) {
    let output = err.downcast_ref::<descil_mturk::Error>().map_or_else(
        || ErrorOutput {
            code: "INTERNAL".to_string(),
            status: None,
            message: format!("{err:#}"),
        },
        ErrorOutput::from,
    );
    output.render(output_mode);
}
