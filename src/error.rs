//! Error types for mTLS certificate operations
//!
//! Callers can tell "the provider reported zero hostnames" (an empty `Ok`
//! list) apart from "the call failed" (an `Err`); the two are never
//! conflated.

use thiserror::Error;

/// Errors surfaced by mTLS certificate operations
#[derive(Debug, Error)]
pub enum MtlsError {
    /// No usable API token could be resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The CA bundle file could not be read
    #[error("Cannot read bundle '{path}': {source}")]
    BundleRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The API answered with success == false
    #[error("Cloudflare API error: {0}")]
    Api(String),

    /// The request never produced a well-formed API response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
