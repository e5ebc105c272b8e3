//! OMS state machine for one order's exchange-side lifecycle.
//!
//! # Design
//!
//! Explicit state machine for a single submitted order. Every lifecycle
//! event is applied via [`OmsOrder::apply`], which enforces two invariants:
//!
//! 1. **Legal transitions only.** Illegal events return
//!    [`TransitionError`]; callers must treat this as a halt/alert signal
//!.
//! 2. **Idempotent replay.** If an `event_id` is supplied and has already
//!    been applied, the call is a silent no-op.
//!
//! Narrower than a general OMS: this system has no order-amend capability.
//! A protective stop is resynced by cancel + place-new, never replace, so
//! there is no `ReplacePending` state here.
//!
//! ```text
//!   new()        Submit          PartialFill/Fill (from CancelPending too —
//!  ──────► Pending ──────► Submitted ───────────► the broker may fill
//!                               │    ▲              before processing a
//!                     CancelRequest  │ CancelReject  cancel)
//!                               ▼    │
//!                         CancelPending ──CancelAck──► Cancelled (term.)
//!                               │
//!                          (Fill also lands here) ──► Filled (term.)
//!
//!   any non-terminal live state ──Reject──► Rejected (term.)
//!   Pending ──Fail──► Failed (term.)   (submission itself never reached the exchange)
//! ```

use qte_domain::Qty;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderState {
    /// Constructed locally, not yet acknowledged by the exchange.
    Pending,
    /// Exchange acknowledged the order; no fills yet.
    Submitted,
    /// One or more partial fills received.
    PartiallyFilled,
    /// Fully filled. **Terminal.**
    Filled,
    /// A cancel request has been sent; awaiting exchange acknowledgement.
    CancelPending,
    /// Cancel acknowledged. **Terminal.**
    Cancelled,
    /// Exchange rejected the order. **Terminal.**
    Rejected,
    /// Submission itself failed after exhausting retries. **Terminal.**
    Failed,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderState::Filled | OrderState::Cancelled | OrderState::Rejected | OrderState::Failed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OmsEvent {
    /// Exchange acknowledged the order, assigning an id.
    Submit { exchange_order_id: String },
    /// A partial fill arrived.
    PartialFill { delta_qty: Qty, avg_price: qte_domain::Price },
    /// The fill that completes the order arrived.
    Fill { delta_qty: Qty, avg_price: qte_domain::Price },
    /// Local decision to cancel (reduce-only stop resync, strategy exit retraction, …).
    CancelRequest,
    CancelAck,
    CancelReject,
    /// Exchange rejected the order outright.
    Reject,
    /// Submission exhausted its retry budget without ever reaching the exchange.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: OrderState,
    pub event: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal OMS transition: {:?} + {}", self.from, self.event)
    }
}

impl std::error::Error for TransitionError {}

/// A locally tracked order, driven through [`OrderState`] by [`OmsOrder::apply`].
#[derive(Debug, Clone)]
pub struct OmsOrder {
    pub client_order_id: String,
    pub exchange_order_id: Option<String>,
    pub total_qty: Qty,
    pub filled_qty: Qty,
    pub avg_fill_price: Option<qte_domain::Price>,
    pub state: OrderState,
    applied: HashSet<String>,
}

impl OmsOrder {
    pub fn new(client_order_id: impl Into<String>, total_qty: Qty) -> Self {
        OmsOrder {
            client_order_id: client_order_id.into(),
            exchange_order_id: None,
            total_qty,
            filled_qty: Qty::ZERO,
            avg_fill_price: None,
            state: OrderState::Pending,
            applied: HashSet::new(),
        }
    }

    /// Apply an event. `event_id`, if supplied, is deduplicated against
    /// previously applied ids — replaying the same event log (e.g. on
    /// restart after a crash) converges to the same state.
    pub fn apply(&mut self, event: &OmsEvent, event_id: Option<&str>) -> Result<(), TransitionError> {
        if let Some(id) = event_id {
            if self.applied.contains(id) {
                return Ok(());
            }
        }
        self.do_transition(event)?;
        if let Some(id) = event_id {
            self.applied.insert(id.to_string());
        }
        Ok(())
    }

    fn do_transition(&mut self, event: &OmsEvent) -> Result<(), TransitionError> {
        use OmsEvent::*;
        use OrderState::*;

        match (&self.state, event) {
            (Pending, Submit { exchange_order_id }) => {
                self.exchange_order_id = Some(exchange_order_id.clone());
                self.state = Submitted;
            }

            (Submitted | PartiallyFilled | CancelPending, PartialFill { delta_qty, avg_price }) => {
                self.filled_qty = self.filled_qty + *delta_qty;
                self.avg_fill_price = Some(*avg_price);
                self.state = PartiallyFilled;
            }

            (Submitted | PartiallyFilled | CancelPending, Fill { delta_qty, avg_price }) => {
                self.filled_qty = self.filled_qty + *delta_qty;
                self.avg_fill_price = Some(*avg_price);
                self.state = Filled;
            }

            (Filled, Fill { .. } | PartialFill { .. }) => {}

            (Submitted | PartiallyFilled, CancelRequest) => self.state = CancelPending,

            (CancelPending, CancelAck) => self.state = Cancelled,

            (CancelPending, CancelReject) => {
                self.state = if self.filled_qty.is_positive() {
                    PartiallyFilled
                } else {
                    Submitted
                };
            }

            (Pending | Submitted | PartiallyFilled | CancelPending, Reject) => {
                self.state = Rejected;
            }

            (Pending, Fail) => {
                self.state = Failed;
            }

            (state, ev) => {
                return Err(TransitionError {
                    from: state.clone(),
                    event: format!("{ev:?}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_order() -> OmsOrder {
        OmsOrder::new("cid-1", Qty::new(dec!(1)))
    }

    #[test]
    fn new_order_starts_pending() {
        let o = pending_order();
        assert_eq!(o.state, OrderState::Pending);
        assert!(!o.state.is_terminal());
    }

    #[test]
    fn submit_then_partial_then_full_fill() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Submit { exchange_order_id: "ex-1".into() }, Some("a1"))
            .unwrap();
        assert_eq!(o.state, OrderState::Submitted);
        o.apply(
            &OmsEvent::PartialFill { delta_qty: Qty::new(dec!(0.6)), avg_price: qte_domain::Price::new(dec!(100)) },
            Some("f1"),
        )
        .unwrap();
        assert_eq!(o.state, OrderState::PartiallyFilled);
        o.apply(
            &OmsEvent::Fill { delta_qty: Qty::new(dec!(0.4)), avg_price: qte_domain::Price::new(dec!(100.5)) },
            Some("f2"),
        )
        .unwrap();
        assert_eq!(o.state, OrderState::Filled);
        assert!(o.state.is_terminal());
    }

    #[test]
    fn cancel_reject_reverts_to_submitted() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Submit { exchange_order_id: "ex-1".into() }, Some("a1"))
            .unwrap();
        o.apply(&OmsEvent::CancelRequest, Some("c1")).unwrap();
        assert_eq!(o.state, OrderState::CancelPending);
        o.apply(&OmsEvent::CancelReject, Some("c2")).unwrap();
        assert_eq!(o.state, OrderState::Submitted);
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_unchanged() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Submit { exchange_order_id: "ex-1".into() }, Some("a1"))
            .unwrap();
        o.apply(
            &OmsEvent::Fill { delta_qty: Qty::new(dec!(1)), avg_price: qte_domain::Price::new(dec!(100)) },
            Some("f1"),
        )
        .unwrap();
        let err = o.apply(&OmsEvent::CancelRequest, Some("c1")).unwrap_err();
        assert_eq!(err.from, OrderState::Filled);
        assert_eq!(o.state, OrderState::Filled);
    }

    #[test]
    fn idempotent_replay_does_not_double_apply() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Submit { exchange_order_id: "ex-1".into() }, Some("a1"))
            .unwrap();
        o.apply(
            &OmsEvent::PartialFill { delta_qty: Qty::new(dec!(0.5)), avg_price: qte_domain::Price::new(dec!(100)) },
            Some("f1"),
        )
        .unwrap();
        o.apply(
            &OmsEvent::PartialFill { delta_qty: Qty::new(dec!(0.5)), avg_price: qte_domain::Price::new(dec!(100)) },
            Some("f1"),
        )
        .unwrap();
        assert_eq!(o.filled_qty.raw(), dec!(0.500));
    }

    #[test]
    fn fill_during_cancel_pending_completes_the_order() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Submit { exchange_order_id: "ex-1".into() }, Some("a1"))
            .unwrap();
        o.apply(&OmsEvent::CancelRequest, Some("c1")).unwrap();
        o.apply(
            &OmsEvent::Fill { delta_qty: Qty::new(dec!(1)), avg_price: qte_domain::Price::new(dec!(100)) },
            Some("f1"),
        )
        .unwrap();
        assert_eq!(o.state, OrderState::Filled);
    }

    #[test]
    fn submission_failure_before_any_ack_is_terminal_failed() {
        let mut o = pending_order();
        o.apply(&OmsEvent::Fail, Some("x1")).unwrap();
        assert_eq!(o.state, OrderState::Failed);
    }
}
