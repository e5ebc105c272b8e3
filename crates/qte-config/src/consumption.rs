//! Run-mode-scoped lists of the config keys each mode actually reads.
//!
//! [`check_unused_keys`] walks the loaded config and flags any top-level
//! pointer outside the active mode's list — a key set in YAML that nothing
//! in the running process will ever consume, almost always a typo or a
//! copy-pasted section left over from another mode.

use serde_json::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Paper,
    Live,
}

pub fn consumed_pointers(mode: RunMode) -> &'static [&'static str] {
    match mode {
        RunMode::Backtest => BACKTEST,
        RunMode::Paper => PAPER,
        RunMode::Live => LIVE,
    }
}

static BACKTEST: &[&str] = &["/risk", "/backtest", "/marketdata"];

static PAPER: &[&str] = &["/risk", "/live", "/notify", "/marketdata"];

static LIVE: &[&str] = &["/risk", "/live", "/notify", "/marketdata"];

/// Top-level keys present in `config_json` that the active `mode` never
/// reads. Returns pointers like `/unknown_section`, not values.
pub fn unused_top_level_keys(config_json: &Value, mode: RunMode) -> Vec<String> {
    let Value::Object(map) = config_json else {
        return Vec::new();
    };
    let consumed = consumed_pointers(mode);
    map.keys()
        .map(|k| format!("/{k}"))
        .filter(|ptr| !consumed.contains(&ptr.as_str()))
        .collect()
}

/// Log a warning per unused key found. Callers that want a hard failure
/// instead (strict mode) should check `unused_top_level_keys` directly.
pub fn warn_unused_keys(config_json: &Value, mode: RunMode) {
    for ptr in unused_top_level_keys(config_json, mode) {
        tracing::warn!(pointer = %ptr, mode = ?mode, "config key not consumed by this run mode");
    }
}
