//! Webhook notifier capability interfaces.
//!
//! A real HTTP-POST implementation is an external collaborator concern and
//! is out of scope here; these traits commit to the shape so a real
//! implementation can be dropped in later. `NullNotifier` and
//! `LoggingNotifier` are the working defaults for local/dev use. Defined
//! here, alongside [`crate::ExchangeAdapter`], rather than in the crate
//! that provides concrete exchange adapters — `TradingEngine` is the
//! caller that actually invokes a notifier, so the trait lives next to its
//! caller, not its implementer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qte_domain::{Price, Qty, Side, Symbol};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// `{event, exchange, scene, message, exception, timestamp}`.
#[derive(Clone, Debug)]
pub struct ExchangeUnavailableEvent {
    pub exchange: String,
    pub scene: String,
    pub message: String,
    pub exception: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// `{event, exchange, fillEventId, strategyId, symbol, side, avgFillPrice,
/// filledQuantity, pnl?, timestamp}`.
#[derive(Clone, Debug)]
pub struct TradeFillEvent {
    pub fill_event_id: String,
    pub strategy_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub avg_fill_price: Price,
    pub filled_quantity: Qty,
    pub pnl: Option<Price>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait NetworkAlertNotifier: Send + Sync {
    async fn notify_exchange_unavailable(&self, event: ExchangeUnavailableEvent);
}

#[async_trait]
pub trait TradeFillNotifier: Send + Sync {
    async fn notify_trade_fill(&self, event: TradeFillEvent);
}

/// Discards every event. The default when `notify.*.enabled` is `false`.
pub struct NullNotifier;

#[async_trait]
impl NetworkAlertNotifier for NullNotifier {
    async fn notify_exchange_unavailable(&self, _event: ExchangeUnavailableEvent) {}
}

#[async_trait]
impl TradeFillNotifier for NullNotifier {
    async fn notify_trade_fill(&self, _event: TradeFillEvent) {}
}

/// Logs events via `tracing` instead of POSTing them anywhere — a working
/// default for local/dev rather than a stub that panics.
pub struct LoggingNotifier;

#[async_trait]
impl NetworkAlertNotifier for LoggingNotifier {
    async fn notify_exchange_unavailable(&self, event: ExchangeUnavailableEvent) {
        info!(
            exchange = %event.exchange,
            scene = %event.scene,
            message = %event.message,
            exception = ?event.exception,
            "exchange unavailable"
        );
    }
}

#[async_trait]
impl TradeFillNotifier for LoggingNotifier {
    async fn notify_trade_fill(&self, event: TradeFillEvent) {
        info!(
            strategy_id = %event.strategy_id,
            symbol = %event.symbol.pair_string(),
            fill_event_id = %event.fill_event_id,
            "trade fill"
        );
    }
}

/// Deduplicates trade-fill webhook deliveries by `fillEventId` over a
/// 24-hour TTL, so a retried or replayed fill never double-fires the
/// webhook.
pub struct FillEventCache {
    ttl: chrono::Duration,
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for FillEventCache {
    fn default() -> Self {
        FillEventCache::new(chrono::Duration::hours(24))
    }
}

impl FillEventCache {
    pub fn new(ttl: chrono::Duration) -> Self {
        FillEventCache { ttl, seen: Mutex::new(HashMap::new()) }
    }

    /// `true` if `fill_event_id` has not been seen within the TTL window as
    /// of `now` — the caller should send the webhook and then this marks it
    /// seen. Returns `false` (skip sending) for anything still within TTL.
    pub fn should_send(&self, fill_event_id: &str, now: DateTime<Utc>) -> bool {
        let mut seen = self.seen.lock().expect("fill event cache mutex poisoned");
        seen.retain(|_, seen_at| now.signed_duration_since(*seen_at) < self.ttl);
        if seen.contains_key(fill_event_id) {
            return false;
        }
        seen.insert(fill_event_id.to_string(), now);
        true
    }
}

/// Cooldown gate for exchange-unavailable alerts: honors `.cooldown.seconds`
/// so a persistent outage sends at most one alert per window.
pub struct AlertCooldown {
    cooldown: chrono::Duration,
    last_sent: Mutex<Option<DateTime<Utc>>>,
}

impl AlertCooldown {
    pub fn new(cooldown_seconds: i64) -> Self {
        AlertCooldown { cooldown: chrono::Duration::seconds(cooldown_seconds), last_sent: Mutex::new(None) }
    }

    /// `true` if enough time has elapsed since the last alert to send
    /// another one. Marks `now` as the last-sent time as a side effect,
    /// matching `should_send` on [`FillEventCache`].
    pub fn should_send(&self, now: DateTime<Utc>) -> bool {
        let mut last_sent = self.last_sent.lock().expect("alert cooldown mutex poisoned");
        if let Some(prev) = *last_sent {
            if now.signed_duration_since(prev) < self.cooldown {
                return false;
            }
        }
        *last_sent = Some(now);
        true
    }
}
