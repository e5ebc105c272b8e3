//! `qte health show`: print the persisted Strategy Health Supervisor state
//!.

use anyhow::{Context, Result};
use qte_persistence::HealthStore;
use std::path::PathBuf;

pub fn show_health(state_path: PathBuf) -> Result<()> {
    let store = HealthStore::new(&state_path)
        .with_context(|| format!("open health store at {}", state_path.display()))?;
    let records = store.load().with_context(|| format!("load health state from {}", state_path.display()))?;

    if records.is_empty() {
        println!("no persisted strategy health state at {}", state_path.display());
        return Ok(());
    }

    for record in &records {
        println!(
            "strategy_id={} state={:?} trade_count={}",
            record.strategy_id,
            record.state,
            record.trades.len()
        );
    }
    Ok(())
}
