//! Runtime secret resolution: config YAML stores only env var **names**;
//! this module reads the named variables once at startup and hands back a
//! struct whose `Debug` impl redacts every value, so a secret can never
//! leak through a log line or a panic message.

use serde_json::Value;

/// Webhook URLs resolved from the environment. Both are optional in every
/// run mode.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub network_alert_webhook: Option<String>,
    pub trade_fill_webhook: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("network_alert_webhook", &self.network_alert_webhook.as_ref().map(|_| "<REDACTED>"))
            .field("trade_fill_webhook", &self.trade_fill_webhook.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve webhook secrets named by `notify.exchange.network.webhook_url_env`
/// and `notify.trade.fill.webhook_url_env`. Falls back to the conventional
/// env var names when the config is silent on which variable to read.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let network_var = read_str_at(config_json, "/notify/exchange/network/webhook_url_env")
        .unwrap_or_else(|| "QTE_NETWORK_ALERT_WEBHOOK".to_string());
    let fill_var = read_str_at(config_json, "/notify/trade/fill/webhook_url_env")
        .unwrap_or_else(|| "QTE_TRADE_FILL_WEBHOOK".to_string());

    ResolvedSecrets {
        network_alert_webhook: resolve_env(&network_var),
        trade_fill_webhook: resolve_env(&fill_var),
    }
}
