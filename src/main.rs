mod analysis;
mod aqi;
mod cli;
mod data;
mod error;
mod models;

use std::ffi::OsStr;
use std::path::Path;

use clap::Parser;
use cli::{App, Cli, Commands, CorrelateArgs, CycleArgs};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use error::{AppError, Result};
use tracing::{error, info};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Environment variable overriding the rolling log file location.
const LOG_PATH_ENV: &str = "AIRQ_LOG";

fn main() -> Result<()> {
    let _log_guard = init_logging();

    info!("Initializing air quality analytics app...");

    let cli = Cli::parse();
    let command = cli.command;

    let mut app = match App::new(cli.data) {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to initialize application. Check logs.".red()
            );
            return Err(e);
        },
    };

    // Non-interactive mode: run the given subcommand once and exit.
    if let Some(command) = command {
        return match app.run_command(command) {
            Ok(()) => Ok(()),
            Err(AppError::EmptyResult(msg)) => {
                println!("{} {}", "No data for this selection:".yellow(), msg);
                Ok(())
            },
            Err(e) => {
                error!("Command execution failed: {:?}", e);
                println!("{} {}", "Error executing command:".red(), e.to_string().red());
                Err(e)
            },
        };
    }

    println!(
        "{}",
        "Welcome to the Air Quality Analytics CLI!".cyan().bold()
    );
    println!("Data source: {}", app.data_path().display());

    // Main interactive loop
    loop {
        let options = &[
            "Current Air Quality Status",
            "Temporal Cycle Aggregation",
            "Daily Trend with Rolling Average",
            "Pollutant Correlations",
            "Reload Dataset",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()? // Handle potential cancellation (e.g., Ctrl+C)
            .unwrap_or(options.len() - 1); // Default to Exit if cancelled

        println!("\n---\n");

        let command_result = match selection {
            0 => app
                .prompt_filter()
                .and_then(|filter| app.run_command(Commands::Current(filter))),
            1 => {
                let granularity = match cli::prompt_granularity() {
                    Ok(g) => g,
                    Err(e) => {
                        println!("{} {}", "Failed to get input:".red(), e);
                        continue;
                    },
                };
                app.prompt_filter().and_then(|filter| {
                    app.run_command(Commands::Cycle(CycleArgs {
                        granularity,
                        filter,
                    }))
                })
            },
            2 => app
                .prompt_filter()
                .and_then(|filter| app.run_command(Commands::Trend(filter))),
            3 => app.prompt_filter().and_then(|filter| {
                app.run_command(Commands::Correlate(CorrelateArgs {
                    filter,
                    x: None,
                    y: None,
                }))
            }),
            4 => app.run_command(Commands::Reload),
            5 => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            _ => unreachable!(), // Should not happen with the current setup
        };

        // Empty selections are informational; everything else is an error.
        match command_result {
            Ok(()) => {},
            Err(AppError::EmptyResult(msg)) => {
                println!("{} {}", "No data for this selection:".yellow(), msg);
            },
            Err(e) => {
                error!("Command execution failed: {:?}", e);
                println!(
                    "{} {}",
                    "Error executing command:".red(),
                    e.to_string().red()
                );
            },
        }

        println!("\n---\n");
    }

    Ok(())
}

/// Logging setup: filtered stderr output plus a JSON daily-rolling file.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    dotenv::dotenv().ok(); // Load .env before reading log configuration

    let log_file_path =
        std::env::var(LOG_PATH_ENV).unwrap_or_else(|_| "logs/airq.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("airq.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        );

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
