use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::analysis::{
    aggregate_by_cycle, correlation_matrix, current_metrics, daily_trend, date_bounds,
    distinct_cities, filter_readings, high_risk_alerts, latest_snapshot, rank_cities,
    regression_stats, selection_stats, DateRange,
};
use crate::cli::render;
use crate::data::{DatasetCache, SampleDataProvider};
use crate::error::{AppError, Result};
use crate::models::{CycleGranularity, Pollutant, Reading};

/// Default location of the source CSV, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/all_cities_aqi_combined.csv";

/// Environment variable overriding the source CSV location.
pub const DATA_PATH_ENV: &str = "AIRQ_DATA";

/// Days of generated history when falling back to sample data.
const SAMPLE_SPAN_DAYS: i64 = 400;

/// Grid days shown per city in the trend table.
const TREND_DISPLAY_DAYS: usize = 30;

/// CLI tool for air quality analytics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the source CSV file (falls back to AIRQ_DATA, then the default)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show current air quality status, ranking and alerts per city
    Current(FilterArgs),

    /// Aggregate AQI over a recurring cycle (hour of day, day of week, month)
    Cycle(CycleArgs),

    /// Daily AQI trend with an adaptive rolling average
    Trend(FilterArgs),

    /// Pollutant correlation matrix and optional pairwise regression
    Correlate(CorrelateArgs),

    /// Drop the cached dataset and reread the source file
    Reload,
}

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Restrict to these cities (repeatable); all cities when omitted
    #[arg(short = 'c', long = "city")]
    pub cities: Vec<String>,

    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Emit the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CycleArgs {
    /// Cycle to group by
    #[arg(value_enum)]
    pub granularity: CycleArg,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Pollutant on the x axis of an optional pairwise regression
    #[arg(long, requires = "y")]
    pub x: Option<String>,

    /// Pollutant on the y axis of an optional pairwise regression
    #[arg(long, requires = "x")]
    pub y: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CycleArg {
    Hour,
    Day,
    Month,
}

impl CycleArg {
    pub fn granularity(self) -> CycleGranularity {
        match self {
            CycleArg::Hour => CycleGranularity::HourOfDay,
            CycleArg::Day => CycleGranularity::DayOfWeek,
            CycleArg::Month => CycleGranularity::Month,
        }
    }
}

/// Resolves a pollutant name as typed on the command line.
pub fn parse_pollutant(name: &str) -> Result<Pollutant> {
    match name.to_lowercase().replace('.', "").as_str() {
        "pm25" => Ok(Pollutant::Pm25),
        "pm10" => Ok(Pollutant::Pm10),
        "no2" => Ok(Pollutant::No2),
        "so2" => Ok(Pollutant::So2),
        "co" => Ok(Pollutant::Co),
        _ => Err(AppError::Cli(format!(
            "Unknown pollutant '{}'. Expected one of: PM2.5, PM10, NO2, SO2, CO",
            name
        ))),
    }
}

/// CLI application: owns the dataset cache and the sample-data fallback.
pub struct App {
    data_path: PathBuf,
    cache: DatasetCache,
    sample_provider: SampleDataProvider,
    sample: Option<Arc<Vec<Reading>>>,
}

impl App {
    /// Creates the application, resolving the data path from the CLI
    /// argument, then the environment, then the default location.
    pub fn new(data: Option<PathBuf>) -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let data_path = match data {
            Some(path) => path,
            None => env::var(DATA_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH)),
        };
        info!("Using data source {}", data_path.display());

        Ok(Self {
            data_path,
            cache: DatasetCache::new(),
            sample_provider: SampleDataProvider::new(),
            sample: None,
        })
    }

    /// Run a single command against the loaded dataset.
    pub fn run_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Current(args) => self.show_current(&args),
            Commands::Cycle(args) => self.show_cycle(args.granularity.granularity(), &args.filter),
            Commands::Trend(args) => self.show_trend(&args),
            Commands::Correlate(args) => self.show_correlation(&args),
            Commands::Reload => self.reload(),
        }
    }

    /// Returns the dataset, loading it (or generating the sample fallback)
    /// on first use.
    pub fn dataset(&mut self) -> Result<Arc<Vec<Reading>>> {
        if self.data_path.exists() {
            let spinner = progress_spinner("Loading air quality data...")?;
            let result = self.cache.load(&self.data_path);
            spinner.finish_and_clear();
            return result;
        }

        if let Some(sample) = &self.sample {
            return Ok(Arc::clone(sample));
        }

        warn!(
            "Data file {} not found, generating sample data",
            self.data_path.display()
        );
        println!(
            "{}",
            format!(
                "Data file {} not found. Using generated sample data.",
                self.data_path.display()
            )
            .yellow()
        );
        let end = Local::now().naive_local();
        let sample = Arc::new(self.sample_provider.generate(end, SAMPLE_SPAN_DAYS)?);
        self.sample = Some(Arc::clone(&sample));
        Ok(sample)
    }

    /// Applies city and date filters, completing a half-open date range
    /// from the dataset's bounds.
    fn apply_filter(&self, readings: &[Reading], args: &FilterArgs) -> Result<Vec<Reading>> {
        let cities: Option<&[String]> = if args.cities.is_empty() {
            None
        } else {
            Some(&args.cities)
        };

        let range = match (args.from, args.to) {
            (None, None) => None,
            (from, to) => {
                let (first, last) = date_bounds(readings).ok_or_else(|| {
                    AppError::EmptyResult("the dataset holds no readings".to_string())
                })?;
                Some(DateRange::new(from.unwrap_or(first), to.unwrap_or(last))?)
            },
        };

        filter_readings(readings, cities, range)
    }

    /// Current air quality status: headline metrics, ranking, alerts.
    fn show_current(&mut self, args: &FilterArgs) -> Result<()> {
        let readings = self.dataset()?;
        let filtered = self.apply_filter(&readings, args)?;
        let snapshots = latest_snapshot(&filtered);

        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
            return Ok(());
        }

        let metrics = current_metrics(&snapshots)?;
        println!(
            "Worst affected city: {} (AQI {:.1}, {})",
            metrics.worst.city.red().bold(),
            metrics.worst.aqi,
            metrics.worst.risk
        );
        println!(
            "Best air quality:    {} (AQI {:.1}, {})",
            metrics.best.city.green().bold(),
            metrics.best.aqi,
            metrics.best.risk
        );
        println!("Average AQI across cities: {:.1}", metrics.mean_aqi);
        println!();

        let ranked = rank_cities(&snapshots);
        println!("{}", render::snapshot_table(&ranked));

        let alerts = high_risk_alerts(&snapshots);
        if !alerts.is_empty() {
            println!("{}", "High risk alerts:".red().bold());
            for alert in alerts {
                println!("  {}", alert.red());
            }
        }

        let stats = selection_stats(&filtered)?;
        println!(
            "Selection: {} readings, AQI mean {:.1} (min {:.1}, max {:.1})",
            stats.count, stats.mean_aqi, stats.min_aqi, stats.max_aqi
        );

        Ok(())
    }

    /// Cycle aggregation table for the selected granularity.
    fn show_cycle(&mut self, granularity: CycleGranularity, args: &FilterArgs) -> Result<()> {
        let readings = self.dataset()?;
        let filtered = self.apply_filter(&readings, args)?;
        let stats = aggregate_by_cycle(&filtered, granularity);

        if args.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Average AQI by {}", granularity.to_string().cyan());
        println!("{}", render::cycle_table(granularity, &stats));
        Ok(())
    }

    /// Daily trend with the adaptive rolling average, one table per city.
    fn show_trend(&mut self, args: &FilterArgs) -> Result<()> {
        let readings = self.dataset()?;
        let filtered = self.apply_filter(&readings, args)?;
        let series = daily_trend(&filtered);

        if args.json {
            println!("{}", serde_json::to_string_pretty(&series)?);
            return Ok(());
        }

        for city_series in &series {
            println!(
                "{} ({}-day rolling average)",
                city_series.city.cyan().bold(),
                city_series.window_days
            );
            let (table, skipped) = render::trend_table(city_series, TREND_DISPLAY_DAYS);
            println!("{}", table);
            if skipped > 0 {
                println!(
                    "... showing the last {} of {} days",
                    city_series.points.len() - skipped,
                    city_series.points.len()
                );
            }
            println!();
        }
        Ok(())
    }

    /// Correlation matrix over all pollutants, plus an optional pair fit.
    fn show_correlation(&mut self, args: &CorrelateArgs) -> Result<()> {
        let readings = self.dataset()?;
        let filtered = self.apply_filter(&readings, &args.filter)?;
        let matrix = correlation_matrix(&filtered, &Pollutant::ALL);

        if args.filter.json {
            println!("{}", serde_json::to_string_pretty(&matrix)?);
            return Ok(());
        }

        println!("{}", "Pollutant correlation matrix".cyan());
        println!("{}", render::correlation_table(&matrix));

        if let (Some(x_name), Some(y_name)) = (&args.x, &args.y) {
            let x = parse_pollutant(x_name)?;
            let y = parse_pollutant(y_name)?;
            match regression_stats(&filtered, x, y) {
                Some(stats) => println!(
                    "{}",
                    render::regression_line(&x.to_string(), &y.to_string(), &stats)
                ),
                None => println!(
                    "{}",
                    "Not enough complete pairs for a regression fit.".yellow()
                ),
            }
        }
        Ok(())
    }

    /// Drops cached data so the next query rereads the source.
    fn reload(&mut self) -> Result<()> {
        if !self.cache.is_loaded() && self.sample.is_none() {
            println!("{}", "No cached dataset to clear.".yellow());
            return Ok(());
        }
        self.cache.invalidate();
        self.sample = None;
        println!("{}", "Dataset cache cleared.".green());
        Ok(())
    }

    /// Interactive filter prompt used by the menu loop: multi-select the
    /// cities, then an optional date window.
    pub fn prompt_filter(&mut self) -> Result<FilterArgs> {
        let readings = self.dataset()?;
        let cities = distinct_cities(&readings);

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Cities (space toggles, empty selection keeps all)")
            .items(&cities)
            .interact()?;
        let cities: Vec<String> = if selected.is_empty() || selected.len() == cities.len() {
            Vec::new()
        } else {
            selected.into_iter().map(|i| cities[i].clone()).collect()
        };

        let from = prompt_date("Start date (YYYY-MM-DD, empty for full range)")?;
        let to = prompt_date("End date (YYYY-MM-DD, empty for full range)")?;

        Ok(FilterArgs {
            cities,
            from,
            to,
            json: false,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

/// Prompts for the cycle granularity.
pub fn prompt_granularity() -> Result<CycleArg> {
    let options = ["Hour of day", "Day of week", "Month"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Aggregate by")
        .items(&options)
        .default(0)
        .interact()?;
    Ok(match selection {
        0 => CycleArg::Hour,
        1 => CycleArg::Day,
        _ => CycleArg::Month,
    })
}

fn prompt_date(prompt: &str) -> Result<Option<NaiveDate>> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let date = trimmed
        .parse::<NaiveDate>()
        .map_err(|e| AppError::Cli(format!("Invalid date '{}': {}", trimmed, e)))?;
    Ok(Some(date))
}

fn progress_spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(StdDuration::from_millis(80));
    Ok(spinner)
}
