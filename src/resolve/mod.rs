//! Resolution state machine: from info-hash to playable link.
//!
//! Drives a torrent from "unknown to the provider" to a resolvable direct
//! link through a bounded sequence of states:
//!
//! 1. **ProbeCache** — assume the torrent is known and ready; try to
//!    produce a direct link immediately.
//! 2. **Discover** — find-or-create the torrent, then branch on its
//!    normalized status.
//! 3. **Retry** — one re-submission when the provider-side torrent is
//!    errored; never more.
//!
//! ProbeCache runs at most twice and Retry at most once, so the worst case
//! is a small constant number of provider round trips. A rejected
//! credential short-circuits out of every state; every other failure is
//! folded into a terminal [`ResolutionOutcome`].

mod registry;

use std::borrow::Cow;

use tracing::{debug, info, instrument, warn};

use crate::client::{Credential, DebridClient, TorrentStatus};
use crate::error::ProviderError;

/// Terminal result of a resolution attempt.
///
/// Closed contract: no partial or ambiguous state leaks to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A playable direct link was produced.
    DirectLink(String),
    /// The provider is still fetching the torrent; try again later.
    Downloading,
    /// The account lacks the tier required for this operation.
    AccessDenied,
    /// The single permitted re-submission did not make the torrent ready.
    DownloadFailed,
    /// An unrecoverable failure, with diagnostic detail.
    Error(String),
}

impl DebridClient {
    /// Resolves an info-hash and file selector to a terminal outcome.
    ///
    /// The file selector is the encoded filename token handed back from
    /// the availability probe (the middle segment of the deferred
    /// locator).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthenticationExpired`] — and only that —
    /// when the provider rejects the credential, with no further provider
    /// calls. Every other failure becomes a [`ResolutionOutcome`].
    #[instrument(skip(self, credential), fields(info_hash))]
    pub async fn resolve(
        &self,
        info_hash: &str,
        file_selector: &str,
        credential: &Credential,
    ) -> Result<ResolutionOutcome, ProviderError> {
        // ProbeCache: the optimistic first attempt.
        match self.probe_direct_link(info_hash, file_selector, credential).await {
            Ok(link) => {
                info!("resolved from cache on first probe");
                return Ok(ResolutionOutcome::DirectLink(link));
            }
            Err(ProviderError::AuthenticationExpired) => {
                return Err(ProviderError::AuthenticationExpired);
            }
            Err(ProviderError::AccessDenied { detail }) => {
                info!(detail = %detail, "access denied during cache probe");
                return Ok(ResolutionOutcome::AccessDenied);
            }
            Err(error) => {
                debug!(error = %error, "cache probe missed; discovering torrent");
            }
        }
        self.discover(info_hash, file_selector, credential).await
    }

    /// Discover state: find-or-create, then branch on normalized status.
    async fn discover(
        &self,
        info_hash: &str,
        file_selector: &str,
        credential: &Credential,
    ) -> Result<ResolutionOutcome, ProviderError> {
        let display_name = decode_selector(file_selector);
        let torrent = match self
            .find_or_create(info_hash, Some(&display_name), credential)
            .await
        {
            Ok(torrent) => torrent,
            Err(error) => return Self::terminal_from_error(error),
        };

        match torrent.torrent_status() {
            TorrentStatus::Ready => {
                // The torrent is confirmed known now; one more probe.
                debug!(torrent_id = torrent.id, "torrent ready; probing cache again");
                match self.probe_direct_link(info_hash, file_selector, credential).await {
                    Ok(link) => Ok(ResolutionOutcome::DirectLink(link)),
                    Err(error) => Self::terminal_from_error(error),
                }
            }
            TorrentStatus::Downloading => {
                info!(torrent_id = torrent.id, "torrent still downloading");
                Ok(ResolutionOutcome::Downloading)
            }
            TorrentStatus::Errored => {
                info!(torrent_id = torrent.id, "torrent errored; retrying submission");
                self.retry_create(info_hash, file_selector, credential).await
            }
            TorrentStatus::Unknown => {
                let error = ProviderError::unavailable(
                    "discover",
                    "provider reported an unrecognized torrent status",
                );
                warn!(torrent_id = torrent.id, "unrecognized torrent status");
                Ok(ResolutionOutcome::Error(error.to_string()))
            }
        }
    }

    /// Retry state: one re-submission, then either a final probe or
    /// `DownloadFailed`. Never loops.
    async fn retry_create(
        &self,
        info_hash: &str,
        file_selector: &str,
        credential: &Credential,
    ) -> Result<ResolutionOutcome, ProviderError> {
        let display_name = decode_selector(file_selector);
        let torrent = match self
            .create_and_find(info_hash, Some(&display_name), credential)
            .await
        {
            Ok(torrent) => torrent,
            Err(ProviderError::AuthenticationExpired) => {
                return Err(ProviderError::AuthenticationExpired);
            }
            Err(ProviderError::AccessDenied { .. }) => {
                return Ok(ResolutionOutcome::AccessDenied);
            }
            Err(error) => {
                warn!(error = %error, "re-submission failed");
                return Ok(ResolutionOutcome::DownloadFailed);
            }
        };

        if torrent.torrent_status() == TorrentStatus::Ready {
            match self.probe_direct_link(info_hash, file_selector, credential).await {
                Ok(link) => Ok(ResolutionOutcome::DirectLink(link)),
                Err(error) => Self::terminal_from_error(error),
            }
        } else {
            info!(torrent_id = torrent.id, "torrent not ready after re-submission");
            Ok(ResolutionOutcome::DownloadFailed)
        }
    }

    /// Direct-link probe: authoritative cache check, registry lookup,
    /// selector match, link request.
    ///
    /// The cache check here is separate from the earlier bulk probe on
    /// purpose: availability can change between listing and resolving, and
    /// a torrent reported ready may still lack the requested file. Both
    /// misses surface as [`ProviderError::NotFound`], which transitions
    /// the state machine instead of crashing it.
    async fn probe_direct_link(
        &self,
        info_hash: &str,
        file_selector: &str,
        credential: &Credential,
    ) -> Result<String, ProviderError> {
        let cached = self.check_cached(&[info_hash], credential).await?;
        if !cached
            .iter()
            .any(|entry| entry.hash.eq_ignore_ascii_case(info_hash))
        {
            return Err(ProviderError::not_found(format!(
                "cached entry for {info_hash}"
            )));
        }

        let wanted = decode_selector(file_selector);
        let torrent = self
            .find_or_create(info_hash, Some(&wanted), credential)
            .await?;
        let file = torrent
            .files
            .iter()
            .find(|f| f.short_name == wanted || f.short_name == file_selector)
            .ok_or_else(|| {
                ProviderError::not_found(format!(
                    "file '{wanted}' in torrent {info_hash}"
                ))
            })?;

        self.request_download_link(torrent.id, file.id, credential).await
    }
}

impl DebridClient {
    /// Folds a provider error into its terminal outcome, keeping the
    /// credential-rejection signal out-of-band.
    fn terminal_from_error(error: ProviderError) -> Result<ResolutionOutcome, ProviderError> {
        match error {
            ProviderError::AuthenticationExpired => Err(ProviderError::AuthenticationExpired),
            ProviderError::AccessDenied { .. } => Ok(ResolutionOutcome::AccessDenied),
            other => Ok(ResolutionOutcome::Error(other.to_string())),
        }
    }
}

/// Decodes the percent-encoded selector token back to a filename for exact
/// short-name matching. An undecodable token is matched verbatim.
fn decode_selector(file_selector: &str) -> String {
    urlencoding::decode(file_selector)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| file_selector.to_string())
}
