use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("record at {path} is corrupt and has been quarantined to {quarantined_to}: {source}")]
    Quarantined { path: String, quarantined_to: String, #[source] source: serde_json::Error },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
