//! Per-strategy health state machine.
//!
//! `ENABLED -> DEGRADED -> DISABLED -> ENABLED`, driven purely by a
//! [`RollingEvSnapshot`] and a [`HealthConfig`] — no hidden mutation, same
//! idiom as the order state machine in `qte-execution`.

use crate::calculator::RollingEvSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Enabled,
    Degraded,
    Disabled,
}

impl HealthState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, HealthState::Enabled | HealthState::Degraded)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HealthConfig {
    pub min_sample_size: usize,
    pub min_ev_negative_trades: usize,
    pub min_ev: Decimal,
    pub max_consecutive_losses: u32,
    /// When `false`, a DISABLED strategy never auto-recovers; only an
    /// explicit `enable_strategy` call can move it back to ENABLED.
    pub auto_enable: bool,
}

impl HealthConfig {
    pub fn conservative_default() -> Self {
        HealthConfig {
            min_sample_size: 5,
            min_ev_negative_trades: 5,
            min_ev: Decimal::ZERO,
            max_consecutive_losses: 3,
            auto_enable: false,
        }
    }
}

/// Evaluate the next state for one strategy, given its current state and
/// the latest rolling snapshot. Evaluated on every new closed trade once
/// `sampleSize >= minSampleSize`; below that threshold the state never
/// moves (not enough data to judge).
pub fn transition(current: HealthState, snapshot: &RollingEvSnapshot, config: &HealthConfig) -> HealthState {
    if snapshot.sample_size < config.min_sample_size {
        return current;
    }

    if snapshot.consecutive_losses >= config.max_consecutive_losses {
        return HealthState::Disabled;
    }

    match current {
        HealthState::Enabled => {
            if snapshot.sample_size >= config.min_ev_negative_trades && snapshot.rolling_ev < config.min_ev {
                HealthState::Degraded
            } else {
                HealthState::Enabled
            }
        }
        HealthState::Degraded => {
            if snapshot.rolling_ev >= config.min_ev && snapshot.consecutive_losses < config.max_consecutive_losses {
                HealthState::Enabled
            } else {
                HealthState::Degraded
            }
        }
        HealthState::Disabled => {
            if config.auto_enable
                && snapshot.rolling_ev >= config.min_ev
                && snapshot.consecutive_losses < config.max_consecutive_losses
            {
                HealthState::Enabled
            } else {
                HealthState::Disabled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(sample_size: usize, rolling_ev: Decimal, consecutive_losses: u32) -> RollingEvSnapshot {
        RollingEvSnapshot {
            sample_size,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            rolling_ev,
            consecutive_losses,
        }
    }

    #[test]
    fn below_min_sample_size_never_transitions() {
        let config = HealthConfig::conservative_default();
        let snap = snapshot(1, dec!(-100), 0);
        assert_eq!(transition(HealthState::Enabled, &snap, &config), HealthState::Enabled);
    }

    #[test]
    fn consecutive_losses_disables_from_any_state() {
        let config = HealthConfig::conservative_default();
        let snap = snapshot(5, dec!(10), 3);
        assert_eq!(transition(HealthState::Enabled, &snap, &config), HealthState::Disabled);
        assert_eq!(transition(HealthState::Degraded, &snap, &config), HealthState::Disabled);
    }

    #[test]
    fn enabled_degrades_on_negative_ev() {
        let config = HealthConfig::conservative_default();
        let snap = snapshot(5, dec!(-1), 1);
        assert_eq!(transition(HealthState::Enabled, &snap, &config), HealthState::Degraded);
    }

    #[test]
    fn degraded_recovers_once_ev_and_losses_clear() {
        let config = HealthConfig::conservative_default();
        let snap = snapshot(5, dec!(1), 0);
        assert_eq!(transition(HealthState::Degraded, &snap, &config), HealthState::Enabled);
    }

    #[test]
    fn disabled_never_auto_recovers_without_auto_enable() {
        let config = HealthConfig::conservative_default();
        let snap = snapshot(5, dec!(1), 0);
        assert_eq!(transition(HealthState::Disabled, &snap, &config), HealthState::Disabled);
    }

    #[test]
    fn disabled_auto_recovers_when_auto_enable_set() {
        let mut config = HealthConfig::conservative_default();
        config.auto_enable = true;
        let snap = snapshot(5, dec!(1), 0);
        assert_eq!(transition(HealthState::Disabled, &snap, &config), HealthState::Enabled);
    }
}
