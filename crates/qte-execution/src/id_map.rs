//! Internal → exchange order-ID mapping.
//!
//! After a successful submit, the exchange assigns its own order id. Cancel
//! operations must target the **exchange** id — sending the client id to a
//! live exchange silently cancels nothing or 404s.
//!
//! Callers must:
//! 1. Call [`ExchangeOrderMap::register`] immediately after every successful
//!    submit.
//! 2. Call [`ExchangeOrderMap::exchange_id`] before every cancel. `None`
//!    means the mapping is missing and the cancel must be aborted — never
//!    fabricate an id.
//! 3. Call [`ExchangeOrderMap::deregister`] once an order reaches a terminal
//!    state, to keep the map bounded.

use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct ExchangeOrderMap {
    map: HashMap<String, String>,
}

impl ExchangeOrderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any existing mapping for `client_order_id` — an idempotent
    /// retry the exchange accepted a second time re-registers cleanly.
    pub fn register(&mut self, client_order_id: impl Into<String>, exchange_order_id: impl Into<String>) {
        self.map.insert(client_order_id.into(), exchange_order_id.into());
    }

    pub fn exchange_id(&self, client_order_id: &str) -> Option<&str> {
        self.map.get(client_order_id).map(|s| s.as_str())
    }

    pub fn deregister(&mut self, client_order_id: &str) {
        self.map.remove(client_order_id);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
