//! Atomic persistence for Strategy Health Supervisor state, stored at
//! `data/monitor/health-state.json`. A single file holding every
//! tracked strategy's state and trade window, rather than one file per
//! strategy, since the whole set is small and always loaded together.

use crate::error::PersistenceError;
use crate::order_store::write_atomic;
use qte_health::PersistedStrategyHealth;
use std::fs;
use std::path::PathBuf;

pub struct HealthStore {
    path: PathBuf,
}

impl HealthStore {
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(HealthStore { path })
    }

    pub fn save(&self, records: &[PersistedStrategyHealth]) -> Result<(), PersistenceError> {
        let tmp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(records)
            .expect("PersistedStrategyHealth serialization is infallible for well-formed values");
        write_atomic(&tmp_path, &self.path, &body)
    }

    /// Returns an empty vec if no state has ever been persisted yet
    /// (first run) rather than erroring.
    pub fn load(&self) -> Result<Vec<PersistedStrategyHealth>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let body = fs::read(&self.path)
            .map_err(|source| PersistenceError::Io { path: self.path.display().to_string(), source })?;
        match serde_json::from_slice(&body) {
            Ok(records) => Ok(records),
            Err(source) => {
                let quarantine_path = self.path.with_extension("corrupt");
                let _ = fs::rename(&self.path, &quarantine_path);
                Err(PersistenceError::Quarantined {
                    path: self.path.display().to_string(),
                    quarantined_to: quarantine_path.display().to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qte_health::HealthState;

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HealthStore::new(tmp.path().join("health-state.json")).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HealthStore::new(tmp.path().join("health-state.json")).unwrap();
        let records = vec![PersistedStrategyHealth {
            strategy_id: "strat-1".into(),
            state: HealthState::Degraded,
            trades: Vec::new(),
        }];
        store.save(&records).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].strategy_id, "strat-1");
        assert_eq!(loaded[0].state, HealthState::Degraded);
    }
}
