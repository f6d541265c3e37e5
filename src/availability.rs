//! Batched cache-availability probing.
//!
//! The provider charges one request per lookup and caps each cache check at
//! a fixed number of hashes, so candidate torrents are probed in chunks
//! that run concurrently and merge into a single lookup table keyed by
//! `(info-hash, file-index)`. A failed chunk degrades to no entries for
//! that chunk instead of failing the whole call; only a rejected credential
//! aborts everything.

use std::collections::HashMap;
use std::fmt;

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use crate::client::{Credential, DebridClient};
use crate::error::ProviderError;

/// A torrent/file pair a caller wants availability information for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStream {
    /// Torrent info-hash.
    pub info_hash: String,
    /// Index of the desired file within the torrent.
    pub file_index: u32,
    /// Filename of the desired file; becomes the selector token the
    /// resolve step later matches against the provider's file list.
    pub file_name: String,
}

impl CandidateStream {
    /// Creates a new candidate stream.
    #[must_use]
    pub fn new(
        info_hash: impl Into<String>,
        file_index: u32,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            info_hash: info_hash.into(),
            file_index,
            file_name: file_name.into(),
        }
    }

    /// The lookup key for this stream's cache entry.
    #[must_use]
    pub fn key(&self) -> StreamKey {
        StreamKey::new(&self.info_hash, self.file_index)
    }

    /// The deferred-resolution locator for this stream: not yet a direct
    /// media link, but everything the resolve step needs to produce one.
    #[must_use]
    pub fn deferred_locator(&self) -> String {
        format!(
            "{}/{}/{}",
            self.info_hash,
            urlencoding::encode(&self.file_name),
            self.file_index
        )
    }
}

/// Lookup key for a cache entry: `"{info_hash}@{file_index}"`.
///
/// Embedding both parts means lookups never cross file indices and chunk
/// merges cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey(String);

impl StreamKey {
    /// Builds the key for an info-hash/file-index pair.
    #[must_use]
    pub fn new(info_hash: &str, file_index: u32) -> Self {
        Self(format!("{info_hash}@{file_index}"))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an availability probe for one candidate stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Deferred-resolution locator (see [`CandidateStream::deferred_locator`]).
    pub url: String,
    /// Best-effort, point-in-time flag from the provider; not a guarantee.
    pub cached: bool,
}

impl DebridClient {
    /// Checks cache availability for an arbitrary number of candidate
    /// streams.
    ///
    /// Streams are partitioned into chunks of at most the configured batch
    /// size; one probe is issued per chunk and chunks run concurrently
    /// under the client's concurrency cap, with no ordering guarantee.
    /// Every input stream appears in the output exactly once, with
    /// `cached = true` only when the provider's hash list includes it. A
    /// chunk whose probe fails contributes no entries (logged, not raised).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthenticationExpired`] when the provider
    /// rejects the credential; all other probe failures degrade per chunk.
    #[instrument(skip_all, fields(stream_count = streams.len()))]
    pub async fn check_availability(
        &self,
        streams: &[CandidateStream],
        credential: &Credential,
    ) -> Result<HashMap<StreamKey, CacheEntry>, ProviderError> {
        if streams.is_empty() {
            return Ok(HashMap::new());
        }

        let probes = streams
            .chunks(self.config.batch_size)
            .map(|chunk| self.probe_chunk(chunk, credential));
        let results = join_all(probes).await;

        let mut merged = HashMap::with_capacity(streams.len());
        for result in results {
            merged.extend(result?);
        }
        debug!(
            entries = merged.len(),
            cached = merged.values().filter(|e| e.cached).count(),
            "merged availability chunks"
        );
        Ok(merged)
    }

    /// Probes one chunk. Produces an entry for every stream in the chunk;
    /// degrades to no entries when the probe fails for any reason other
    /// than a rejected credential.
    async fn probe_chunk(
        &self,
        chunk: &[CandidateStream],
        credential: &Credential,
    ) -> Result<HashMap<StreamKey, CacheEntry>, ProviderError> {
        let hashes: Vec<&str> = chunk.iter().map(|s| s.info_hash.as_str()).collect();
        let available = match self.check_cached(&hashes, credential).await {
            Ok(cached) => cached,
            Err(error @ ProviderError::AuthenticationExpired) => return Err(error),
            Err(error) => {
                warn!(error = %error, chunk_len = chunk.len(), "availability probe failed; dropping chunk");
                return Ok(HashMap::new());
            }
        };

        let mut entries = HashMap::with_capacity(chunk.len());
        for stream in chunk {
            let cached = available
                .iter()
                .any(|entry| entry.hash.eq_ignore_ascii_case(&stream.info_hash));
            entries.insert(
                stream.key(),
                CacheEntry {
                    url: stream.deferred_locator(),
                    cached,
                },
            );
        }
        Ok(entries)
    }
}
