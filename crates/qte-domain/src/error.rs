//! Shared error taxonomy.
//!
//! Every crate in this workspace surfaces failures through [`ErrorKind`] so
//! log lines and persisted failure records carry one stable vocabulary,
//! rather than each crate inventing its own string. Crates that need a
//! richer error (carrying a source error, extra context) wrap `ErrorKind`
//! in their own `thiserror` enum and expose `.kind()`.

use std::fmt;

/// Disposition-bearing error kind, independent of which crate raised it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied a malformed or out-of-range argument.
    InvalidArgument,
    /// Exchange I/O timed out or the connection reset; recovered by retry.
    TransientNetwork,
    /// HTTP 429 / exchange rate-limit response.
    RateLimited,
    /// Exchange rejected the order outright (bad params, insufficient margin).
    ExchangeRejected,
    /// Risk gate vetoed a signal. Not an error in the panicking sense —
    /// logged with a reason code, never retried.
    RiskVeto,
    /// A persisted order/health-state file could not be parsed.
    PersistenceCorruption,
    /// Internal state contradiction (e.g. a position with negative quantity).
    InvariantViolation,
    /// A required configuration key was absent at startup.
    ConfigMissing,
}

impl ErrorKind {
    /// Stable lowercase-snake string used in log lines and persisted
    /// failure records, so dashboards can group on it across process
    /// restarts and crate boundaries.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ExchangeRejected => "exchange_rejected",
            ErrorKind::RiskVeto => "risk_veto",
            ErrorKind::PersistenceCorruption => "persistence_corruption",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::ConfigMissing => "config_missing",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A domain-level error: an [`ErrorKind`] plus a human-readable message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DomainError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        DomainError {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, message)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
