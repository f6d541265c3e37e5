//! Shared HTTP client construction policy for the provider boundary.
//!
//! Centralizes networking defaults so every provider call uses the same
//! timeout, user-agent, and compression settings. Timeouts come from
//! [`ProviderConfig`] rather than process-wide state so multiple
//! credentials/environments can coexist with different policies.

use reqwest::Client;

use crate::client::ProviderConfig;
use crate::error::ProviderError;

/// Builds the User-Agent sent on every provider request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("debrid-core/{version}")
}

/// Builds the shared provider HTTP client from per-client configuration.
///
/// Every provider call must run under a short timeout; the provider is slow
/// and rate-limited, and a hung call would stall the whole resolution.
///
/// # Errors
///
/// Returns [`ProviderError::Unexpected`] when client construction fails.
pub(crate) fn build_provider_http_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .user_agent(default_user_agent())
        .gzip(true)
        .build()
        .map_err(|e| {
            ProviderError::unexpected(
                "client_construction",
                &format!("HTTP client construction failed: {e}"),
            )
        })
}
