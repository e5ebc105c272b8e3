mod candles;
mod commands;
mod demo_strategy;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use qte_domain::{DomainError, ErrorKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qte")]
#[command(about = "Perpetual-futures trading engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lifecycle commands
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },

    /// Strategy health supervisor inspection
    Health {
        #[command(subcommand)]
        cmd: HealthCmd,
    },

    /// Compute a layered config's canonical hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (later overrides earlier)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RunCmd {
    /// Replay historical candles through the strategy/risk/fill pipeline.
    Backtest {
        /// CSV file of closed candles (see `qte_cli::candles` for columns)
        #[arg(long)]
        candles: PathBuf,
        /// Trading pair, e.g. BTC-USDT
        #[arg(long)]
        symbol: String,
        /// Candle interval, e.g. 1m or 5m
        #[arg(long, default_value = "1m")]
        interval: String,
        /// Layered config YAML paths, in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
        /// Demo SMA-crossover fast period
        #[arg(long, default_value_t = 10)]
        fast: usize,
        /// Demo SMA-crossover slow period
        #[arg(long, default_value_t = 30)]
        slow: usize,
    },

    /// Live trading. Not implemented in this workspace — no real exchange
    /// adapter exists (`qte-exchange` ships only `PaperExchange`), so this
    /// fails closed rather than pretending to trade.
    Live {
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum HealthCmd {
    /// Print the persisted strategy health supervisor state.
    Show {
        /// Path to health-state.json
        #[arg(long, default_value = "data/monitor/health-state.json")]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run { cmd } => match cmd {
            RunCmd::Backtest { candles, symbol, interval, config_paths, fast, slow } => {
                commands::backtest::run_backtest(candles, symbol, interval, config_paths, fast, slow)?;
            }
            RunCmd::Live { config_paths: _ } => {
                let err = DomainError::new(
                    ErrorKind::ConfigMissing,
                    "run live requires a configured exchange adapter; none is wired in this workspace",
                );
                return Err(err.into());
            }
        },
        Commands::Health { cmd } => match cmd {
            HealthCmd::Show { state } => commands::health::show_health(state)?,
        },
        Commands::ConfigHash { paths } => commands::backtest::print_config_hash(paths)?,
    }

    Ok(())
}
