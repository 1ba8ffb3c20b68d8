//! Credential Configuration
//!
//! The API token is resolved exactly once at process start - explicit value
//! first, then the `CLOUDFLARE_API_KEY` environment variable (which may come
//! from a local `.env` file). Business logic never reads the environment
//! directly; it only sees the resolved `Config`.

use crate::error::MtlsError;

/// Environment variable consulted when no explicit token is given
pub const TOKEN_ENV_VAR: &str = "CLOUDFLARE_API_KEY";

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloudflare API token (sent as a Bearer credential)
    pub api_token: String,
    /// Verify the API server's TLS certificate; disable only for diagnostics
    pub verify_ssl: bool,
}

impl Config {
    /// Build a config from an already-resolved token value.
    ///
    /// A missing or empty token is a configuration error; nothing reaches
    /// the network without one.
    pub fn new(api_token: Option<String>, verify_ssl: bool) -> Result<Self, MtlsError> {
        match api_token.filter(|token| !token.is_empty()) {
            Some(api_token) => Ok(Self {
                api_token,
                verify_ssl,
            }),
            None => Err(MtlsError::Configuration(format!(
                "{} not found; export it (e.g. {}='xxxxxxxxxxx') or pass --api-token",
                TOKEN_ENV_VAR, TOKEN_ENV_VAR
            ))),
        }
    }
}
