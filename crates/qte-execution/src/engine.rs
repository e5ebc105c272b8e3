//! The core execution engine: turns an approved risk verdict into a
//! submitted exchange order, confirms the resulting fill, tracks the
//! position it opens, resyncs protective stops as they trail, and closes
//! it back out — feeding every outcome to Risk Control and the Strategy
//! Health Supervisor.

use crate::adapter::{ExchangeAdapter, ExchangeError};
use crate::id_map::ExchangeOrderMap;
use crate::notifier::{
    AlertCooldown, ExchangeUnavailableEvent, FillEventCache, NetworkAlertNotifier, NullNotifier,
    TradeFillEvent, TradeFillNotifier,
};
use crate::oms::{OmsEvent, OmsOrder, OrderState};
use crate::types::{
    bucket_time, derive_client_order_id, reprice_entry, CancelRequest, ExchangePositionView,
    ExecutionError, OrderStatusKind, OrderStatusReport, SubmitRequest,
};
use qte_domain::{ClosedTrade, DomainResult, ExitReason, Order, OrderType, Position, PositionSide, Price, Qty, Side, Symbol};
use qte_health::HealthSupervisor;
use qte_marketdata::BackoffSchedule;
use qte_reconcile::{ReconcileDiff, ReconcileReport};
use qte_risk::{evaluate_stop_sync, ApprovedOrder, RiskState, StopSyncDecision};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry budget for a single submission: beyond this many
/// attempts, the caller marks the order FAILED rather than retrying forever.
const MAX_SUBMIT_ATTEMPTS: u32 = 3;

/// Bounded poll budget for confirming a fill: beyond this many attempts
/// without reaching a terminal status, the caller treats the order as
/// failed rather than tracking a position that was never actually filled.
const MAX_POLL_ATTEMPTS: u32 = 20;

pub struct TradingEngine<A: ExchangeAdapter> {
    adapter: A,
    tracked_positions: HashMap<String, Position>,
    orders: HashMap<String, OmsOrder>,
    domain_orders: HashMap<String, Order>,
    id_map: ExchangeOrderMap,
    exchange_stops: HashMap<String, Price>,
    network_notifier: Arc<dyn NetworkAlertNotifier>,
    trade_fill_notifier: Arc<dyn TradeFillNotifier>,
    fill_event_cache: FillEventCache,
    network_alert_cooldown: AlertCooldown,
}

impl<A: ExchangeAdapter> TradingEngine<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_notifiers(adapter, Arc::new(NullNotifier), Arc::new(NullNotifier))
    }

    /// Construct with real network-alert/trade-fill webhook notifiers
    /// rather than the silent [`NullNotifier`] default.
    pub fn with_notifiers(
        adapter: A,
        network_notifier: Arc<dyn NetworkAlertNotifier>,
        trade_fill_notifier: Arc<dyn TradeFillNotifier>,
    ) -> Self {
        TradingEngine {
            adapter,
            tracked_positions: HashMap::new(),
            orders: HashMap::new(),
            domain_orders: HashMap::new(),
            id_map: ExchangeOrderMap::new(),
            exchange_stops: HashMap::new(),
            network_notifier,
            trade_fill_notifier,
            fill_event_cache: FillEventCache::default(),
            network_alert_cooldown: AlertCooldown::new(60),
        }
    }

    pub fn tracked_position(&self, symbol: &Symbol) -> Option<&Position> {
        self.tracked_positions.get(&symbol.pair_string())
    }

    pub fn tracked_positions(&self) -> &HashMap<String, Position> {
        &self.tracked_positions
    }

    /// Re-price a signal against the current ticker:
    /// BUY takes the ask, SELL takes the bid, and the stop shifts by the
    /// same delta. On ticker failure, falls back to the signal's own
    /// price/stop, fires the network-alert notifier (scene
    /// `entry_reprice_ticker`, subject to its cooldown), and reports the
    /// fallback so the caller can decide whether to still submit.
    pub async fn reprice_for_entry(
        &self,
        symbol: &Symbol,
        side: Side,
        signal_price: Price,
        stop_loss: Price,
        now: chrono::DateTime<chrono::Utc>,
    ) -> (Price, Price, bool) {
        match self.adapter.fetch_ticker(symbol).await {
            Ok(ticker) => {
                let (price, stop) = reprice_entry(side, signal_price, stop_loss, ticker);
                (price, stop, false)
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "entry reprice ticker fetch failed, using signal price");
                if self.network_alert_cooldown.should_send(now) {
                    self.network_notifier
                        .notify_exchange_unavailable(ExchangeUnavailableEvent {
                            exchange: "exchange".to_string(),
                            scene: "entry_reprice_ticker".to_string(),
                            message: format!("ticker fetch failed for {symbol}"),
                            exception: Some(e.to_string()),
                            timestamp: now,
                        })
                        .await;
                }
                (signal_price, stop_loss, true)
            }
        }
    }

    /// Adopt an exchange position we aren't tracking — a pending fill
    /// missed during a connectivity gap.
    /// The stop is re-derived from `stop_distance` (the pending order's own
    /// distance, if known) or else `default_stop_distance`.
    pub fn adopt_position(
        &mut self,
        symbol: &Symbol,
        side: PositionSide,
        entry_price: Price,
        quantity: Qty,
        stop_distance: Option<Price>,
        default_stop_distance: Price,
        now: chrono::DateTime<chrono::Utc>,
        leverage: u32,
    ) -> DomainResult<()> {
        let distance = stop_distance.unwrap_or(default_stop_distance);
        let stop_loss = match side {
            PositionSide::Long => entry_price - distance,
            PositionSide::Short => entry_price + distance,
        };
        let position = Position::open(symbol.clone(), side, entry_price, quantity, stop_loss, now, leverage)?;
        self.tracked_positions.insert(symbol.pair_string(), position);
        Ok(())
    }

    /// Submit an approved entry, retrying transient failures with bounded
    /// exponential backoff, then poll until the order reaches a terminal
    /// status before tracking anything: the position is only opened from
    /// the confirmed `avgFillPrice`, never the pre-fill signal price.
    pub async fn submit_entry(
        &mut self,
        strategy_id: &str,
        symbol: &Symbol,
        side: Side,
        approved: &ApprovedOrder,
        leverage: u32,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), ExecutionError> {
        let client_order_id = derive_client_order_id(strategy_id, symbol, side, bucket_time(now));

        let mut domain_order = Order::new_pending(
            client_order_id.clone(),
            symbol.clone(),
            side,
            OrderType::Market,
            approved.quantity,
            Some(approved.price),
            Some(approved.stop_loss),
            approved.take_profit,
            now,
            strategy_id.to_string(),
            false,
        );
        let mut oms_order = OmsOrder::new(client_order_id.clone(), approved.quantity);

        let req = SubmitRequest {
            client_order_id: client_order_id.clone(),
            symbol: symbol.clone(),
            side,
            order_type: OrderType::Market,
            quantity: approved.quantity,
            price: Some(approved.price),
            reduce_only: false,
        };

        let exchange_order_id = match self.submit_with_retry(req).await {
            Ok(id) => id,
            Err(e) => {
                domain_order.mark_failed();
                let _ = oms_order.apply(&OmsEvent::Fail, None);
                self.domain_orders.insert(client_order_id.clone(), domain_order);
                self.orders.insert(client_order_id, oms_order);
                return Err(ExecutionError::SubmissionFailed(e.to_string()));
            }
        };

        domain_order.mark_submitted(exchange_order_id.clone());
        oms_order.apply(&OmsEvent::Submit { exchange_order_id: exchange_order_id.clone() }, None)?;
        self.id_map.register(client_order_id.clone(), exchange_order_id.clone());

        let report = match self.poll_until_terminal(&exchange_order_id, symbol).await {
            Ok(r) => r,
            Err(e) => {
                // The exchange already acknowledged this order — it may
                // still be live. Leave it SUBMITTED rather than FAILED;
                // reconciliation is what resolves it from here.
                self.domain_orders.insert(client_order_id.clone(), domain_order);
                self.orders.insert(client_order_id, oms_order);
                return Err(e);
            }
        };

        match report.status {
            OrderStatusKind::Filled if report.filled_quantity.is_positive() && report.avg_fill_price.is_positive() => {
                oms_order.apply(
                    &OmsEvent::Fill { delta_qty: report.filled_quantity, avg_price: report.avg_fill_price },
                    None,
                )?;
                domain_order.apply_fill(report.filled_quantity, report.avg_fill_price, now)?;

                let position_side = if side == Side::Buy { PositionSide::Long } else { PositionSide::Short };
                let stop_distance = (approved.price - approved.stop_loss).abs();
                let new_stop = match position_side {
                    PositionSide::Long => report.avg_fill_price - stop_distance,
                    PositionSide::Short => report.avg_fill_price + stop_distance,
                };
                let position = Position::open(
                    symbol.clone(),
                    position_side,
                    report.avg_fill_price,
                    report.filled_quantity,
                    new_stop,
                    now,
                    leverage,
                )?;
                self.tracked_positions.insert(symbol.pair_string(), position);
                self.domain_orders.insert(client_order_id.clone(), domain_order);
                self.orders.insert(client_order_id.clone(), oms_order);

                self.resync_protective_stop(symbol).await?;

                if self.fill_event_cache.should_send(&client_order_id, now) {
                    self.trade_fill_notifier
                        .notify_trade_fill(TradeFillEvent {
                            fill_event_id: client_order_id,
                            strategy_id: strategy_id.to_string(),
                            symbol: symbol.clone(),
                            side,
                            avg_fill_price: report.avg_fill_price,
                            filled_quantity: report.filled_quantity,
                            pnl: None,
                            timestamp: now,
                        })
                        .await;
                }
                Ok(())
            }
            OrderStatusKind::Rejected => {
                domain_order.mark_rejected();
                self.domain_orders.insert(client_order_id.clone(), domain_order);
                self.orders.insert(client_order_id, oms_order);
                Err(ExecutionError::Rejected(exchange_order_id))
            }
            _ => {
                // Reached a terminal status (e.g. CANCELED) without ever
                // filling: the order was acknowledged, so REJECT is the
                // legal OMS transition here, not FAIL (reserved for a
                // submission that never reached the exchange at all).
                domain_order.mark_rejected();
                let _ = oms_order.apply(&OmsEvent::Reject, None);
                self.domain_orders.insert(client_order_id.clone(), domain_order);
                self.orders.insert(client_order_id, oms_order);
                Err(ExecutionError::SubmissionFailed(format!(
                    "entry order {exchange_order_id} did not reach FILLED"
                )))
            }
        }
    }

    /// Submit a reduce-only exit for the tracked position on `symbol`,
    /// sized off the tracked position rather than the caller's guess. On a
    /// confirmed fill, builds the [`ClosedTrade`], feeds it to `risk_state`
    /// and `health`, cancels the now-pointless protective stop, and fires
    /// the trade-fill notifier.
    pub async fn submit_exit(
        &mut self,
        strategy_id: &str,
        symbol: &Symbol,
        approved: &ApprovedOrder,
        now: chrono::DateTime<chrono::Utc>,
        risk_state: &mut RiskState,
        health: &HealthSupervisor,
    ) -> Result<ClosedTrade, ExecutionError> {
        let position = self
            .tracked_positions
            .get(&symbol.pair_string())
            .ok_or_else(|| ExecutionError::UnknownOrder(symbol.pair_string()))?;
        let side = position.side.exit_side();
        let quantity = position.quantity;

        let client_order_id = derive_client_order_id(strategy_id, symbol, side, bucket_time(now));
        let req = SubmitRequest {
            client_order_id: client_order_id.clone(),
            symbol: symbol.clone(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: Some(approved.price),
            reduce_only: true,
        };

        let exchange_order_id = self
            .submit_with_retry(req)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;
        self.id_map.register(client_order_id, exchange_order_id.clone());

        let report = self.poll_until_terminal(&exchange_order_id, symbol).await?;
        match report.status {
            OrderStatusKind::Filled if report.filled_quantity.is_positive() => {
                self.finalize_close(
                    symbol,
                    report.avg_fill_price,
                    report.filled_quantity,
                    ExitReason::StrategyExit,
                    strategy_id,
                    now,
                    risk_state,
                    health,
                )
                .await
            }
            OrderStatusKind::Rejected => Err(ExecutionError::Rejected(exchange_order_id)),
            _ => Err(ExecutionError::SubmissionFailed(format!(
                "exit order {exchange_order_id} did not reach FILLED"
            ))),
        }
    }

    /// Close the tracked position on `symbol` because the exchange
    /// reported the protective stop was triggered: records a
    /// [`ClosedTrade`] with [`ExitReason::StopLoss`] at `stop_price`
    /// without submitting another order (the exchange already closed it).
    pub async fn record_stop_loss_trigger(
        &mut self,
        symbol: &Symbol,
        stop_price: Price,
        strategy_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        risk_state: &mut RiskState,
        health: &HealthSupervisor,
    ) -> Result<ClosedTrade, ExecutionError> {
        let quantity = self
            .tracked_positions
            .get(&symbol.pair_string())
            .ok_or_else(|| ExecutionError::UnknownOrder(symbol.pair_string()))?
            .quantity;
        self.finalize_close(symbol, stop_price, quantity, ExitReason::StopLoss, strategy_id, now, risk_state, health)
            .await
    }

    /// Reconcile tracked positions against `report`'s diffs: a symbol the
    /// exchange holds and we don't track is adopted; a symbol we track
    /// that the exchange no longer holds is closed out as a
    /// [`ClosedTrade`] with [`ExitReason::Reconciliation`] at the last
    /// observed mark. A symbol where both sides hold a non-zero but
    /// differing quantity is left alone — genuine drift report's
    /// [`qte_reconcile::ReconcileAction::Halt`] already flags for the caller to stop trading on,
    /// not something this can safely resolve on its own.
    pub async fn apply_reconcile_report(
        &mut self,
        report: &ReconcileReport,
        exchange_positions: &HashMap<String, ExchangePositionView>,
        strategy_id: &str,
        default_stop_distance: Price,
        leverage: u32,
        now: chrono::DateTime<chrono::Utc>,
        risk_state: &mut RiskState,
        health: &HealthSupervisor,
    ) -> Result<Vec<ClosedTrade>, ExecutionError> {
        let mut closed = Vec::new();
        for diff in &report.diffs {
            let ReconcileDiff::PositionQtyMismatch { symbol, local, exchange } = diff else {
                continue;
            };
            if local.is_zero() && exchange.is_positive() {
                if let Some(view) = exchange_positions.get(symbol) {
                    self.adopt_position(
                        &view.symbol,
                        view.side,
                        view.entry_price,
                        view.quantity,
                        None,
                        default_stop_distance,
                        now,
                        leverage,
                    )?;
                }
            } else if local.is_positive() && exchange.is_zero() {
                let Some(position) = self.tracked_positions.get(symbol).cloned() else {
                    continue;
                };
                let mark = match self.adapter.fetch_ticker(&position.symbol).await {
                    Ok(ticker) => Price::new((ticker.bid.raw() + ticker.ask.raw()) / Decimal::TWO),
                    Err(_) => position.entry_price,
                };
                let trade = self
                    .finalize_close(
                        &position.symbol,
                        mark,
                        position.quantity,
                        ExitReason::Reconciliation,
                        strategy_id,
                        now,
                        risk_state,
                        health,
                    )
                    .await?;
                closed.push(trade);
            }
        }
        Ok(closed)
    }

    /// Shared close path for a confirmed exit fill, a stop-loss trigger, or
    /// a reconciliation-driven close: builds the `ClosedTrade`, feeds
    /// `risk_state`/`health`, cancels the lingering protective stop, and
    /// fires the trade-fill notifier.
    async fn finalize_close(
        &mut self,
        symbol: &Symbol,
        exit_price: Price,
        filled_quantity: Qty,
        exit_reason: ExitReason,
        strategy_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        risk_state: &mut RiskState,
        health: &HealthSupervisor,
    ) -> Result<ClosedTrade, ExecutionError> {
        let position = self
            .tracked_positions
            .remove(&symbol.pair_string())
            .ok_or_else(|| ExecutionError::UnknownOrder(symbol.pair_string()))?;

        let diff = match position.side {
            PositionSide::Long => exit_price - position.entry_price,
            PositionSide::Short => position.entry_price - exit_price,
        };
        let gross_pnl = diff.checked_mul_qty(filled_quantity).unwrap_or(Price::ZERO);

        let trade = ClosedTrade::new(
            symbol.clone(),
            position.side,
            position.entry_price,
            exit_price,
            filled_quantity,
            gross_pnl,
            Price::ZERO,
            position.open_time,
            now,
            strategy_id.to_string(),
            exit_reason,
        );

        risk_state.record_trade_outcome(strategy_id, trade.net_pnl());
        health.record_closed_trade(strategy_id, trade.clone());

        self.cancel_tracked_stop(symbol).await;
        self.exchange_stops.remove(&symbol.pair_string());

        let fill_event_id = format!("close:{}:{}", symbol.pair_string(), trade.trade_id);
        if self.fill_event_cache.should_send(&fill_event_id, now) {
            self.trade_fill_notifier
                .notify_trade_fill(TradeFillEvent {
                    fill_event_id,
                    strategy_id: strategy_id.to_string(),
                    symbol: symbol.clone(),
                    side: position.side.exit_side(),
                    avg_fill_price: exit_price,
                    filled_quantity,
                    pnl: Some(trade.net_pnl()),
                    timestamp: now,
                })
                .await;
        }

        Ok(trade)
    }

    /// Cancel `symbol`'s resting protective stop, if one is tracked. Best
    /// effort: a position being closed is not blocked on the exchange
    /// acknowledging the stop cancel.
    async fn cancel_tracked_stop(&mut self, symbol: &Symbol) {
        let stop_client_order_id = format!("stop:{}", symbol.pair_string());
        if let Some(exchange_order_id) = self.id_map.exchange_id(&stop_client_order_id).map(str::to_string) {
            let _ = self.adapter.cancel(CancelRequest { exchange_order_id, symbol: symbol.clone() }).await;
        }
    }

    async fn submit_with_retry(&self, req: SubmitRequest) -> Result<String, ExchangeError> {
        let mut backoff = BackoffSchedule::new(Duration::from_millis(200), Duration::from_secs(5));
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.adapter.submit(req.clone()).await {
                Ok(resp) => return Ok(resp.exchange_order_id),
                Err(e) if e.is_retryable() && attempt < MAX_SUBMIT_ATTEMPTS => {
                    let delay = backoff.next_delay();
                    warn!(attempt, client_order_id = %req.client_order_id, error = %e, "submit failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll `get_order` until the order reaches a terminal status
    /// (FILLED/CANCELED/REJECTED) or the poll budget is exhausted.
    async fn poll_until_terminal(
        &self,
        exchange_order_id: &str,
        symbol: &Symbol,
    ) -> Result<OrderStatusReport, ExecutionError> {
        let mut delay = Duration::from_millis(50);
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            let report = self
                .adapter
                .get_order(exchange_order_id, symbol)
                .await
                .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;
            if report.status.is_terminal() {
                return Ok(report);
            }
            if attempt == MAX_POLL_ATTEMPTS {
                return Err(ExecutionError::SubmissionFailed(format!(
                    "order {exchange_order_id} did not reach a terminal status within {MAX_POLL_ATTEMPTS} polls"
                )));
            }
            debug!(exchange_order_id, status = ?report.status, attempt, "order not yet terminal, polling again");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(Duration::from_secs(2));
        }
        unreachable!("loop always returns on its last iteration")
    }

    /// Resync a tracked position's protective stop on the exchange: cancel
    /// the existing stop order (if any) and place a new one — stops are
    /// never amended in place.
    pub async fn resync_protective_stop(&mut self, symbol: &Symbol) -> Result<StopSyncDecision, ExecutionError> {
        let Some(position) = self.tracked_positions.get(&symbol.pair_string()) else {
            return Ok(StopSyncDecision::NoChange);
        };
        let existing = self.exchange_stops.get(&symbol.pair_string()).copied();
        let decision = evaluate_stop_sync(position, existing);
        let exit_side = position.side.exit_side();
        let quantity = position.quantity;

        if let StopSyncDecision::Resync(new_stop) = decision {
            let stop_client_order_id = format!("stop:{}", symbol.pair_string());
            let existing_exchange_id = self.id_map.exchange_id(&stop_client_order_id).map(str::to_string);
            if let Some(exchange_order_id) = existing_exchange_id {
                let _ = self
                    .adapter
                    .cancel(CancelRequest { exchange_order_id, symbol: symbol.clone() })
                    .await;
            }
            let client_order_id = stop_client_order_id;
            let req = SubmitRequest {
                client_order_id: client_order_id.clone(),
                symbol: symbol.clone(),
                side: exit_side,
                order_type: OrderType::StopMarket,
                quantity,
                price: Some(new_stop),
                reduce_only: true,
            };
            let resp = self
                .adapter
                .submit(req)
                .await
                .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;
            self.id_map.register(client_order_id, resp.exchange_order_id);
            self.exchange_stops.insert(symbol.pair_string(), new_stop);
            debug!(symbol = %symbol, stop = %new_stop, "protective stop resynced");
        }
        Ok(decision)
    }

    /// Apply an exchange fill event to the tracked order and domain order.
    pub fn apply_fill(
        &mut self,
        client_order_id: &str,
        delta_qty: Qty,
        avg_price: Price,
        is_final: bool,
        event_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), ExecutionError> {
        let oms_order = self
            .orders
            .get_mut(client_order_id)
            .ok_or_else(|| ExecutionError::UnknownOrder(client_order_id.to_string()))?;
        let event = if is_final {
            OmsEvent::Fill { delta_qty, avg_price }
        } else {
            OmsEvent::PartialFill { delta_qty, avg_price }
        };
        oms_order.apply(&event, Some(event_id))?;

        if let Some(domain_order) = self.domain_orders.get_mut(client_order_id) {
            domain_order.apply_fill(oms_order.filled_qty, avg_price, now)?;
        }
        Ok(())
    }

    pub fn order_state(&self, client_order_id: &str) -> Option<&OrderState> {
        self.orders.get(client_order_id).map(|o| &o.state)
    }
}
