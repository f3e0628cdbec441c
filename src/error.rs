use std::time::Duration;

use thiserror::Error;

use crate::browser::surface::BrowserError;

/// Failure taxonomy for a scrape run. `NotFound` and `Timeout` are per-item
/// and never abort a run; `SessionLoggedOut` aborts the current loop and
/// hands control back to the login suspension; `Cancelled` means the external
/// supervisor pulled the plug.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("session is logged out")]
    SessionLoggedOut,

    #[error("run cancelled by supervisor")]
    Cancelled,

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl ScrapeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            waited,
        }
    }
}
