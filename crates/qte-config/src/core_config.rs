//! `CoreConfig`: the immutable, once-at-startup configuration struct.
//! No global singleton — every component that needs config takes a
//! `&CoreConfig` or an owned clone of the section it cares about, built
//! once in `main`/the CLI/the test harness and threaded through
//! explicitly.

use qte_domain::{DomainError, DomainResult, ErrorKind};
use qte_risk::RiskConfig;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::consumption::RunMode;
use crate::load::LoadedConfig;
use crate::secrets::{resolve_secrets, ResolvedSecrets};

/// `backtest.*`: `initial_capital` = 10000,
/// `maker_fee` = 0.0002, `taker_fee` = 0.0004, `slippage` = 0.0005.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestSection {
    pub initial_capital: Decimal,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    pub slippage: Decimal,
}

impl Default for BacktestSection {
    fn default() -> Self {
        BacktestSection {
            initial_capital: Decimal::new(10_000, 0),
            maker_fee: Decimal::new(2, 4),
            taker_fee: Decimal::new(4, 4),
            slippage: Decimal::new(5, 4),
        }
    }
}

/// `live.entry.reprice.*`: `enabled` = false.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LiveSection {
    pub entry_reprice_enabled: bool,
}

/// `notify.exchange.network.*` / `notify.trade.fill.*`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifySection {
    pub network_enabled: bool,
    pub network_cooldown_seconds: i64,
    pub trade_fill_enabled: bool,
}

impl Default for NotifySection {
    fn default() -> Self {
        NotifySection { network_enabled: false, network_cooldown_seconds: 60, trade_fill_enabled: false }
    }
}

/// Bounded rolling-buffer size per (symbol, interval): configurable,
/// defaults to 500.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketDataSection {
    pub buffer_size: usize,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        MarketDataSection { buffer_size: 500 }
    }
}

/// Immutable configuration snapshot, built once at startup and threaded
/// through by value/reference — no global mutable config singleton
/// anywhere in this workspace.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreConfig {
    pub risk: RiskConfig,
    pub backtest: BacktestSection,
    pub live: LiveSection,
    pub notify: NotifySection,
    pub marketdata: MarketDataSection,
    /// SHA-256 of the canonicalized merged config, for reproducibility
    /// (two runs with the same hash read the exact same settings).
    pub config_hash: String,
}

impl CoreConfig {
    /// Build from an already-loaded, merged config tree. `mode` gates which
    /// sections are expected to be read (see [`crate::consumption`]); unused
    /// sections are only warned about by the caller, never rejected here.
    pub fn from_loaded(loaded: &LoadedConfig, _mode: RunMode) -> DomainResult<Self> {
        let v = &loaded.config_json;
        Ok(CoreConfig {
            risk: risk_section(v)?,
            backtest: backtest_section(v)?,
            live: live_section(v),
            notify: notify_section(v)?,
            marketdata: marketdata_section(v)?,
            config_hash: loaded.config_hash.clone(),
        })
    }

    pub fn resolve_secrets(&self, config_json: &Value) -> ResolvedSecrets {
        resolve_secrets(config_json)
    }
}

fn decimal_at(v: &Value, pointer: &str, default: Decimal) -> DomainResult<Decimal> {
    match v.pointer(pointer) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(Decimal::from_f64)
            .ok_or_else(|| DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: not a finite number"))),
        Some(other) => Err(DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected number, found {other}"))),
    }
}

fn bool_at(v: &Value, pointer: &str, default: bool) -> DomainResult<bool> {
    match v.pointer(pointer) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected bool, found {other}"))),
    }
}

fn u32_at(v: &Value, pointer: &str, default: u32) -> DomainResult<u32> {
    match v.pointer(pointer) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .ok_or_else(|| DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected non-negative integer"))),
        Some(other) => Err(DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected integer, found {other}"))),
    }
}

fn i64_at(v: &Value, pointer: &str, default: i64) -> DomainResult<i64> {
    match v.pointer(pointer) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected integer"))),
        Some(other) => Err(DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected integer, found {other}"))),
    }
}

fn usize_at(v: &Value, pointer: &str, default: usize) -> DomainResult<usize> {
    match v.pointer(pointer) {
        None => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .ok_or_else(|| DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected non-negative integer"))),
        Some(other) => Err(DomainError::new(ErrorKind::ConfigMissing, format!("{pointer}: expected integer, found {other}"))),
    }
}

fn risk_section(v: &Value) -> DomainResult<RiskConfig> {
    let defaults = RiskConfig::conservative_defaults();
    Ok(RiskConfig {
        risk_per_trade: qte_domain::Percent::new(decimal_at(v, "/risk/risk_per_trade", defaults.risk_per_trade.raw())?),
        max_position_ratio: qte_domain::Percent::new(decimal_at(
            v,
            "/risk/max_position_ratio",
            defaults.max_position_ratio.raw(),
        )?),
        max_stop_loss_percent: qte_domain::Percent::new(decimal_at(
            v,
            "/risk/max_stop_loss_percent",
            defaults.max_stop_loss_percent.raw(),
        )?),
        max_consecutive_losses: u32_at(v, "/risk/max_consecutive_losses", defaults.max_consecutive_losses)?,
        max_drawdown_percent: qte_domain::Percent::new(decimal_at(
            v,
            "/risk/max_drawdown_percent",
            defaults.max_drawdown_percent.raw(),
        )?),
        leverage: u32_at(v, "/risk/leverage", defaults.leverage)?,
        margin_buffer: decimal_at(v, "/risk/margin_buffer", defaults.margin_buffer)?,
    })
}

fn backtest_section(v: &Value) -> DomainResult<BacktestSection> {
    let d = BacktestSection::default();
    Ok(BacktestSection {
        initial_capital: decimal_at(v, "/backtest/initial_capital", d.initial_capital)?,
        maker_fee: decimal_at(v, "/backtest/maker_fee", d.maker_fee)?,
        taker_fee: decimal_at(v, "/backtest/taker_fee", d.taker_fee)?,
        slippage: decimal_at(v, "/backtest/slippage", d.slippage)?,
    })
}

fn live_section(v: &Value) -> LiveSection {
    LiveSection {
        entry_reprice_enabled: bool_at(v, "/live/entry/reprice/enabled", false).unwrap_or(false),
    }
}

fn notify_section(v: &Value) -> DomainResult<NotifySection> {
    let d = NotifySection::default();
    Ok(NotifySection {
        network_enabled: bool_at(v, "/notify/exchange/network/enabled", d.network_enabled)?,
        network_cooldown_seconds: i64_at(
            v,
            "/notify/exchange/network/cooldown/seconds",
            d.network_cooldown_seconds,
        )?,
        trade_fill_enabled: bool_at(v, "/notify/trade/fill/enabled", d.trade_fill_enabled)?,
    })
}

fn marketdata_section(v: &Value) -> DomainResult<MarketDataSection> {
    let d = MarketDataSection::default();
    Ok(MarketDataSection { buffer_size: usize_at(v, "/marketdata/buffer_size", d.buffer_size)? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::empty_config;
    use serde_json::json;

    #[test]
    fn absent_config_yields_documented_defaults() {
        let loaded = empty_config();
        let core = CoreConfig::from_loaded(&loaded, RunMode::Backtest).unwrap();
        assert_eq!(core.backtest.initial_capital, Decimal::new(10_000, 0));
        assert_eq!(core.backtest.taker_fee, Decimal::new(4, 4));
        assert_eq!(core.live.entry_reprice_enabled, false);
        assert_eq!(core.notify.network_cooldown_seconds, 60);
        assert_eq!(core.marketdata.buffer_size, 500);
        assert_eq!(core.risk, RiskConfig::conservative_defaults());
    }

    #[test]
    fn present_values_override_defaults() {
        let loaded = crate::load::LoadedConfig {
            config_json: json!({"backtest": {"slippage": 0.001}, "risk": {"leverage": 5}}),
            canonical_json: String::new(),
            config_hash: "deadbeef".to_string(),
        };
        let core = CoreConfig::from_loaded(&loaded, RunMode::Backtest).unwrap();
        assert_eq!(core.backtest.slippage, Decimal::new(1, 3));
        assert_eq!(core.risk.leverage, 5);
    }

    #[test]
    fn malformed_value_is_config_missing() {
        let loaded = crate::load::LoadedConfig {
            config_json: json!({"backtest": {"slippage": "not-a-number"}}),
            canonical_json: String::new(),
            config_hash: "deadbeef".to_string(),
        };
        let err = CoreConfig::from_loaded(&loaded, RunMode::Backtest).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfigMissing);
    }
}
