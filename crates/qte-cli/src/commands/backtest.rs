//! `qte run backtest`: load candles + config, replay the demo strategy
//! through [`qte_backtest::BacktestEngine`], print the resulting report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use qte_backtest::{BacktestConfig, BacktestEngine, FillModel};
use qte_config::{warn_unused_keys, CoreConfig, LoadedConfig, RunMode};
use qte_domain::{Interval, Price, Symbol};
use qte_strategy::{AlwaysEnabled, StrategySpec};
use rust_decimal::prelude::FromPrimitive;

use crate::candles::load_candles_csv;
use crate::demo_strategy::SmaCrossoverDemo;

#[allow(clippy::too_many_arguments)]
pub fn run_backtest(
    candles_path: PathBuf,
    symbol: String,
    interval: String,
    config_paths: Vec<String>,
    fast_n: usize,
    slow_n: usize,
) -> Result<()> {
    let symbol = Symbol::parse(&symbol).with_context(|| format!("invalid --symbol {symbol}"))?;
    let interval = Interval::parse(&interval).with_context(|| format!("invalid --interval {interval}"))?;

    let loaded = if config_paths.is_empty() {
        qte_config::empty_config()
    } else {
        let path_refs: Vec<&str> = config_paths.iter().map(String::as_str).collect();
        qte_config::load_layered_yaml(&path_refs)?
    };
    warn_unused_keys(&loaded.config_json, RunMode::Backtest);
    let core = CoreConfig::from_loaded(&loaded, RunMode::Backtest)?;

    let candles = load_candles_csv(&candles_path, &symbol, interval)
        .with_context(|| format!("load candles: {}", candles_path.display()))?;
    if candles.is_empty() {
        anyhow::bail!("candles file {} contained no rows", candles_path.display());
    }

    let fill_model = FillModel {
        slippage: core.backtest.slippage,
        spread: None,
        taker_fee: core.backtest.taker_fee,
        maker_fee: core.backtest.maker_fee,
        limit_order_max_bars: 10,
    };
    let config = BacktestConfig { initial_equity: Price::new(core.backtest.initial_capital), risk: core.risk, fill_model };
    let engine = BacktestEngine::new(config)?;

    let spec = StrategySpec::new("sma-crossover-demo", symbol, interval);
    let stop_loss_fraction = rust_decimal::Decimal::from_f64(0.03).expect("0.03 is representable");
    let strategy = Box::new(SmaCrossoverDemo::new(spec, fast_n, slow_n, stop_loss_fraction));

    let report = engine.run(strategy, &candles, &AlwaysEnabled)?;

    println!("bars_loaded={}", candles.len());
    println!("trade_count={}", report.trade_count);
    println!("wins={} losses={} win_rate={}", report.wins, report.losses, report.win_rate);
    println!("total_return_pct={}", report.total_return_pct);
    println!("annualized_return_pct={}", report.annualized_return_pct);
    println!("max_drawdown_pct={}", report.max_drawdown_pct);
    println!("sharpe_ratio={}", report.sharpe_ratio);
    match report.profit_factor {
        Some(pf) => println!("profit_factor={pf}"),
        None => println!("profit_factor=n/a (no losing trades)"),
    }
    println!("config_hash={}", loaded.config_hash);

    Ok(())
}

pub fn print_config_hash(config_paths: Vec<String>) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(String::as_str).collect();
    let loaded: LoadedConfig = qte_config::load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}
