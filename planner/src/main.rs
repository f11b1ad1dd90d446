//! CLI entry point for the portfolio planner.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use portfolio_prep_feed::yahoo::YahooFeed;
use portfolio_prep_feed::{FetchRequest, PriceSource};
use portfolio_prep_planner::config::Config;
use portfolio_prep_planner::error::{Error, Result};
use portfolio_prep_planner::{compare, generate, pipeline};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Multi-period portfolio planner: solver input and plan-vs-real comparison")]
#[command(version)]
struct Cli {
    /// Path to planner.toml
    #[arg(long, default_value = "planner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch prices, estimate expected returns and write the solver file
    Generate {
        /// Also print the expected-return grid
        #[arg(long)]
        show_returns: bool,
    },

    /// Compare the solver's planned capital with realized returns
    Compare {
        /// Print the date-by-date trajectory
        #[arg(long)]
        trajectory: bool,
    },

    /// Show the asset class of each symbol
    Classify {
        /// Symbols to classify (default: configured universe)
        symbols: Vec<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download closing prices as CSV
    Prices {
        /// Symbols to fetch (default: configured universe)
        symbols: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                process::exit(1);
            }
        }
    } else {
        log::warn!("{} not found, using defaults", cli.config.display());
        Config::default()
    };

    let today = chrono::Local::now().date_naive();
    let feed = YahooFeed::new();

    let result = match cli.command {
        Command::Generate { show_returns } => {
            generate::run(&feed, &config, today).map(|summary| {
                print!("{summary}");
                if show_returns {
                    println!();
                    print!("{}", summary.expected);
                }
            })
        }
        Command::Compare { trajectory } => compare::run(&feed, &config, today).map(|run| {
            if trajectory {
                println!("{:<12} {:>14} {:>14}", "Date", "Planned", "Real");
                for p in &run.trajectory.points {
                    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
                    println!("{:<12} {:>14} {:>14}", p.date, cell(p.planned), cell(p.real));
                }
                println!();
            }
            print!("{}", run.report);
        }),
        Command::Classify { symbols, json } => {
            let symbols = or_universe(symbols, &config);
            let classes = generate::classify_symbols(&feed, &symbols);
            print_classes(&classes, json)
        }
        Command::Prices { symbols, output } => {
            let symbols = or_universe(symbols, &config);
            write_prices(&feed, &symbols, &config, today, output)
        }
    };

    if let Err(e) = result {
        match &e {
            Error::DataUnavailable(_) => {
                eprintln!("Error: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn or_universe(symbols: Vec<String>, config: &Config) -> Vec<String> {
    if symbols.is_empty() {
        config.data.universe()
    } else {
        symbols.into_iter().map(|s| s.trim().to_uppercase()).collect()
    }
}

fn print_classes(classes: &BTreeMap<String, portfolio_prep::AssetClass>, json: bool) -> Result<()> {
    if json {
        let labels: BTreeMap<&str, &str> = classes
            .iter()
            .map(|(s, c)| (s.as_str(), c.label()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&labels)?);
    } else {
        for (symbol, class) in classes {
            println!("{symbol:<8} {class}");
        }
    }
    Ok(())
}

fn write_prices(
    feed: &YahooFeed,
    symbols: &[String],
    config: &Config,
    today: chrono::NaiveDate,
    output: Option<PathBuf>,
) -> Result<()> {
    let request: FetchRequest = config.data.fetch_request(today)?;
    let prices = feed.closes(symbols, &request)?;
    match output {
        Some(path) => {
            let file = File::create(&path)?;
            pipeline::write_prices_csv(&prices, file)?;
            log::info!("wrote {} rows to {}", prices.n_dates(), path.display());
        }
        None => pipeline::write_prices_csv(&prices, io::stdout().lock())?,
    }
    Ok(())
}
