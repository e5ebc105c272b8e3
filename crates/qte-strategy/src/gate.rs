/// Consulted before every `analyze` call. Defined here rather than
/// depended-on from the health-supervisor crate so that `qte-strategy`
/// never has to depend on `qte-health` — the supervisor implements this
/// trait and the caller that wires both crates together passes it in as
/// `&dyn StrategyGate`, breaking the cyclic reference with a narrow
/// interface instead of a back-pointer.
pub trait StrategyGate {
    fn is_strategy_enabled(&self, strategy_id: &str) -> bool;
}

/// A gate that never disables anything — used by tests and by callers that
/// have not wired a health supervisor.
pub struct AlwaysEnabled;

impl StrategyGate for AlwaysEnabled {
    fn is_strategy_enabled(&self, _strategy_id: &str) -> bool {
        true
    }
}
