//! Provider client: configuration, construction, and concurrency policy.
//!
//! [`DebridClient`] owns the HTTP client, the per-client configuration, and
//! a semaphore bounding in-flight provider calls. Every endpoint, the
//! batched availability probe, the resolution state machine, and the folder
//! flattener all run through one client instance, so one cap covers them
//! all. Credentials are per-call: a single client can serve any number of
//! accounts against the same provider environment.

pub(crate) mod api;
mod status;

pub use status::TorrentStatus;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

use crate::error::ProviderError;
use crate::http::build_provider_http_client;
use crate::magnet::{MagnetResolver, TrackerlessMagnet};

/// Default provider API origin.
const DEFAULT_BASE_URL: &str = "https://api.torbox.app";
/// Default provider API version segment.
const DEFAULT_API_VERSION: &str = "v1";
/// The provider accepts at most this many hashes per cache check.
const DEFAULT_BATCH_SIZE: usize = 100;
/// Applied to every provider call; the provider is slow and rate-limited,
/// so a short timeout beats a hung resolution.
const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// In-flight provider calls per client. The provider imposes no explicit
/// backpressure, so the client supplies its own.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Remote folder trees are assumed acyclic, but the walk is still bounded.
const DEFAULT_MAX_FOLDER_DEPTH: usize = 16;

/// API key authorizing calls on behalf of one provider account.
///
/// `Debug` is redacted so credentials cannot leak through logs.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Wraps a provider API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(api_key.into())
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Per-client provider configuration.
///
/// Base URL, API version, and batch size are configuration rather than
/// process-wide constants so multiple environments (production, a wiremock
/// test server) can coexist.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider API origin, e.g. `https://api.torbox.app`.
    pub base_url: String,
    /// API version path segment, e.g. `v1`.
    pub api_version: String,
    /// Maximum hashes per cache-availability probe.
    pub batch_size: usize,
    /// TCP connect timeout for provider calls.
    pub connect_timeout: Duration,
    /// Full-request timeout for provider calls.
    pub read_timeout: Duration,
    /// Maximum in-flight provider calls for this client.
    pub max_concurrency: usize,
    /// Maximum folder-tree depth the flattener will walk.
    pub max_folder_depth: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_folder_depth: DEFAULT_MAX_FOLDER_DEPTH,
        }
    }
}

/// Client for one debrid provider environment.
///
/// Cheap to share behind an `Arc`; holds no per-request state. All public
/// operations take the credential explicitly, return classified results,
/// and never panic on provider misbehavior.
pub struct DebridClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ProviderConfig,
    limiter: Arc<Semaphore>,
    pub(crate) magnet: Arc<dyn MagnetResolver>,
}

impl DebridClient {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if HTTP client construction fails or the
    /// configuration is unusable (zero batch size or concurrency).
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.batch_size == 0 {
            return Err(ProviderError::unexpected(
                "client_construction",
                "batch_size must be at least 1",
            ));
        }
        if config.max_concurrency == 0 {
            return Err(ProviderError::unexpected(
                "client_construction",
                "max_concurrency must be at least 1",
            ));
        }
        let http = build_provider_http_client(&config)?;
        debug!(
            base_url = %config.base_url,
            batch_size = config.batch_size,
            max_concurrency = config.max_concurrency,
            "creating debrid client"
        );
        Ok(Self {
            http,
            limiter: Arc::new(Semaphore::new(config.max_concurrency)),
            magnet: Arc::new(TrackerlessMagnet::new()),
            config,
        })
    }

    /// Creates a client with default configuration against a custom base URL
    /// (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if HTTP client construction fails.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let config = ProviderConfig {
            base_url: base_url.into(),
            ..ProviderConfig::default()
        };
        Self::new(config)
    }

    /// Replaces the magnet-resolution collaborator.
    #[must_use]
    pub fn with_magnet_resolver(mut self, magnet: Arc<dyn MagnetResolver>) -> Self {
        self.magnet = magnet;
        self
    }

    /// Returns this client's configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Builds a full endpoint URL under `{base}/{version}/api/`.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/api/{path}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version
        )
    }

    /// Acquires a concurrency slot; held for the duration of one provider call.
    pub(crate) async fn acquire_slot(
        &self,
        operation: &'static str,
    ) -> Result<SemaphorePermit<'_>, ProviderError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| ProviderError::unexpected(operation, "concurrency limiter closed"))
    }
}

impl fmt::Debug for DebridClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebridClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
