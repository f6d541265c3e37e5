//! Magnet-link resolution seam.
//!
//! Submitting a torrent to the provider requires a magnet link, but where
//! that link comes from (a tracker database, a cached index, a bare hash)
//! is outside this crate. [`MagnetResolver`] is the boundary trait;
//! [`TrackerlessMagnet`] is the fallback implementation that synthesizes a
//! trackerless link from the info-hash alone.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Source of magnet links for torrent submission.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn MagnetResolver>`. Rust 2024 native async traits are not
/// object-safe, so `async_trait` is required for the pluggable seam.
#[async_trait]
pub trait MagnetResolver: Send + Sync {
    /// Produces a magnet link for the given info-hash.
    ///
    /// `display_name`, when present, names the torrent in the link (the
    /// `dn` component) so the provider's UI shows something readable.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when no magnet link can be produced.
    async fn magnet_link(
        &self,
        info_hash: &str,
        display_name: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// Synthesizes a trackerless magnet link from a bare info-hash.
///
/// Sufficient for providers that look torrents up by hash in their own
/// swarm/caches; callers with a tracker index can supply a richer
/// implementation instead.
#[derive(Debug, Default)]
pub struct TrackerlessMagnet;

impl TrackerlessMagnet {
    /// Creates a new `TrackerlessMagnet`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Returns true for a plausible BitTorrent info-hash: 40 hex chars (SHA-1)
/// or 32 base32 chars.
fn is_plausible_info_hash(info_hash: &str) -> bool {
    match info_hash.len() {
        40 => info_hash.chars().all(|c| c.is_ascii_hexdigit()),
        32 => info_hash
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | '1' | '8' | '9')),
        _ => false,
    }
}

#[async_trait]
impl MagnetResolver for TrackerlessMagnet {
    #[tracing::instrument(skip(self))]
    async fn magnet_link(
        &self,
        info_hash: &str,
        display_name: Option<&str>,
    ) -> Result<String, ProviderError> {
        if !is_plausible_info_hash(info_hash) {
            return Err(ProviderError::unexpected(
                "magnet_link",
                &format!("'{info_hash}' is not a valid info-hash"),
            ));
        }
        let mut link = format!("magnet:?xt=urn:btih:{}", info_hash.to_ascii_lowercase());
        if let Some(name) = display_name.filter(|n| !n.is_empty()) {
            link.push_str("&dn=");
            link.push_str(&urlencoding::encode(name));
        }
        Ok(link)
    }
}
