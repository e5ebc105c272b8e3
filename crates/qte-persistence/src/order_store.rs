//! Atomic per-order JSON file persistence.
//!
//! One file per order, named `<client_order_id>.json`, written via
//! write-to-temp-then-rename so a crash never leaves a half-written file
//! behind. A file that fails to deserialize is moved aside to
//! `<name>.corrupt` rather than silently dropped or causing a panic.

use crate::error::PersistenceError;
use qte_domain::Order;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct OrderStore {
    dir: PathBuf,
}

impl OrderStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(OrderStore { dir })
    }

    fn path_for(&self, client_order_id: &str) -> PathBuf {
        self.dir.join(format!("{client_order_id}.json"))
    }

    /// Serialize `order` and write it atomically: write to a sibling
    /// `.tmp` file, flush, then rename over the destination.
    pub fn save(&self, order: &Order) -> Result<(), PersistenceError> {
        let path = self.path_for(&order.client_order_id);
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(order)
            .expect("Order serialization is infallible for well-formed values");
        write_atomic(&tmp_path, &path, &body)
    }

    /// Load one order by id. A corrupt file is quarantined to
    /// `<name>.json.corrupt` and the error is still returned — the caller
    /// decides whether a missing/corrupt order is fatal.
    pub fn load(&self, client_order_id: &str) -> Result<Order, PersistenceError> {
        let path = self.path_for(client_order_id);
        load_json(&path)
    }

    /// Load every order file in the store, skipping (and quarantining) any
    /// that fail to parse rather than aborting the whole scan.
    pub fn load_all(&self) -> Result<Vec<Order>, std::io::Error> {
        let mut orders = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_json(&path) {
                Ok(order) => orders.push(order),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable order file"),
            }
        }
        Ok(orders)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let body = fs::read(path).map_err(|source| PersistenceError::Io { path: path.display().to_string(), source })?;
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(value),
        Err(source) => {
            let quarantine_path = path.with_extension("corrupt");
            let _ = fs::rename(path, &quarantine_path);
            Err(PersistenceError::Quarantined {
                path: path.display().to_string(),
                quarantined_to: quarantine_path.display().to_string(),
                source,
            })
        }
    }
}

pub(crate) fn write_atomic(tmp_path: &Path, dest: &Path, body: &[u8]) -> Result<(), PersistenceError> {
    fs::write(tmp_path, body).map_err(|source| PersistenceError::Io { path: tmp_path.display().to_string(), source })?;
    fs::rename(tmp_path, dest).map_err(|source| PersistenceError::Io { path: dest.display().to_string(), source })
}
