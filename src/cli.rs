//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::candle::Candle;
use crate::domain::config_validation::build_engine_config;
use crate::domain::engine::{Engine, EngineConfig};
use crate::domain::error::TradeSetupError;
use crate::ports::data_port::CandlePort;

#[derive(Parser, Debug)]
#[command(name = "tradesetup", about = "Technical setup scorer and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score the setup at the latest candle
    Evaluate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Replay the strategy over the whole candle history
    Backtest {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Validate an engine configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Directory holding `<symbol>.csv` files
    #[arg(short, long)]
    pub data: PathBuf,
    #[arg(short, long)]
    pub symbol: String,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Account capital; defaults to [backtest] initial_capital
    #[arg(long)]
    pub capital: Option<f64>,
    /// Write JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate { input } => run_evaluate(&input),
        Command::Backtest { input } => run_backtest(&input),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(&data),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, TradeSetupError> {
    match path {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            build_engine_config(&FileConfigAdapter::from_file(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Engine, candles and capital shared by `evaluate` and `backtest`.
fn prepare(input: &InputArgs) -> Result<(Engine, Vec<Candle>, f64), TradeSetupError> {
    let config = load_engine_config(input.config.as_deref())?;
    let capital = input.capital.unwrap_or(config.backtest.initial_capital);
    let engine = Engine::new(config)?;

    let candles = CsvAdapter::new(input.data.clone()).fetch_candles(&input.symbol)?;
    tracing::info!(
        "Loaded {} candles for {} from {}",
        candles.len(),
        input.symbol,
        input.data.display()
    );
    Ok((engine, candles, capital))
}

fn run_evaluate(input: &InputArgs) -> Result<(), TradeSetupError> {
    let (engine, candles, capital) = prepare(input)?;
    let result = engine.evaluate(&candles, capital)?;
    tracing::info!(
        "{}: {} score {} trend {}",
        input.symbol,
        result.signal,
        result.score,
        result.trend
    );
    write_json(&result, input.output.as_deref())
}

fn run_backtest(input: &InputArgs) -> Result<(), TradeSetupError> {
    let (engine, candles, capital) = prepare(input)?;
    let result = engine.backtest(&candles, capital)?;
    tracing::info!(
        "{}: {} trades, win rate {:.1}%, profit {:.2} ({:.2}%), max drawdown {:.2}%",
        input.symbol,
        result.total_trades,
        result.win_rate,
        result.profit,
        result.profit_pct,
        result.max_drawdown_pct
    );
    write_json(&result, input.output.as_deref())
}

fn run_validate(config_path: &Path) -> Result<(), TradeSetupError> {
    let config = load_engine_config(Some(config_path))?;
    tracing::info!("Configuration is valid");
    write_json(&config, None)
}

fn run_list_symbols(data: &Path) -> Result<(), TradeSetupError> {
    let symbols = CsvAdapter::new(data.to_path_buf()).list_symbols()?;
    if symbols.is_empty() {
        tracing::info!("No symbols found in {}", data.display());
    }
    for symbol in &symbols {
        println!("{symbol}");
    }
    Ok(())
}

pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), TradeSetupError> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_evaluate_args() {
        let cli = Cli::try_parse_from([
            "tradesetup",
            "evaluate",
            "--data",
            "/tmp/candles",
            "--symbol",
            "BTCUSD",
            "--capital",
            "5000",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate { input } => {
                assert_eq!(input.symbol, "BTCUSD");
                assert_eq!(input.capital, Some(5000.0));
                assert!(input.config.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_list_symbols() {
        let cli = Cli::try_parse_from(["tradesetup", "list-symbols", "--data", "/tmp"]).unwrap();
        assert!(matches!(cli.command, Command::ListSymbols { .. }));
    }

    #[test]
    fn missing_symbol_is_usage_error() {
        assert!(Cli::try_parse_from(["tradesetup", "backtest", "--data", "/tmp"]).is_err());
    }

    #[test]
    fn default_config_without_file() {
        assert_eq!(load_engine_config(None).unwrap(), EngineConfig::default());
    }
}
