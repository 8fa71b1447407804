// src/fetch/error.rs

//! Failure kinds the retry policy has to tell apart. Soft upstream
//! failures (maintenance pages, non-2xx feed responses) are not errors at
//! this level; those surface as `Ok(None)` from the fetch calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure that survived every retry attempt.
    #[error("request to {context} failed after retries: {source}")]
    Transient {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Body was expected to be JSON and was not parseable as such.
    #[error("invalid JSON from {context}: {source}")]
    MalformedPayload {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
