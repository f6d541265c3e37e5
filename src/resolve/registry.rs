//! Torrent registry client: find-or-create against the provider.
//!
//! The provider charges per request and duplicate submissions waste quota,
//! so the registry always consults the account's torrent list before
//! creating, and prefers an existing healthy record over anything else.

use tracing::{debug, instrument, warn};

use crate::client::api::RemoteTorrent;
use crate::client::{Credential, DebridClient, TorrentStatus};
use crate::error::ProviderError;

impl DebridClient {
    /// Finds the account's torrent for `info_hash`, submitting it first
    /// when the provider does not know it yet. `display_name` labels the
    /// submission magnet when a creation turns out to be necessary.
    ///
    /// # Errors
    ///
    /// Both a failed lookup and a failed creation propagate as an
    /// unrecoverable discovery failure.
    #[instrument(skip(self, credential, display_name))]
    pub(crate) async fn find_or_create(
        &self,
        info_hash: &str,
        display_name: Option<&str>,
        credential: &Credential,
    ) -> Result<RemoteTorrent, ProviderError> {
        if let Some(torrent) = self.find_existing(info_hash, credential).await? {
            debug!(torrent_id = torrent.id, "found existing torrent");
            return Ok(torrent);
        }
        debug!("torrent unknown to provider; submitting");
        self.create_and_find(info_hash, display_name, credential).await
    }

    /// Looks `info_hash` up in the account's torrent list.
    ///
    /// Among several matches (re-submissions leave duplicates behind) a
    /// non-errored record wins; if every match is errored the first one is
    /// returned so the caller can see the errored status and retry.
    pub(crate) async fn find_existing(
        &self,
        info_hash: &str,
        credential: &Credential,
    ) -> Result<Option<RemoteTorrent>, ProviderError> {
        let torrents = self.my_list(credential).await?;
        let matches: Vec<RemoteTorrent> = torrents
            .into_iter()
            .filter(|t| t.hash.eq_ignore_ascii_case(info_hash))
            .collect();
        if matches.is_empty() {
            return Ok(None);
        }
        let chosen = matches
            .iter()
            .position(|t| t.torrent_status() != TorrentStatus::Errored)
            .unwrap_or(0);
        Ok(matches.into_iter().nth(chosen))
    }

    /// Submits `info_hash` via magnet link and re-lists to retrieve the
    /// created record.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] when the torrent still does not
    /// appear in the list after creation.
    #[instrument(skip(self, credential, display_name))]
    pub(crate) async fn create_and_find(
        &self,
        info_hash: &str,
        display_name: Option<&str>,
        credential: &Credential,
    ) -> Result<RemoteTorrent, ProviderError> {
        let magnet_link = self.magnet.magnet_link(info_hash, display_name).await?;
        self.create_torrent(&magnet_link, credential).await?;

        match self.find_existing(info_hash, credential).await? {
            Some(torrent) => Ok(torrent),
            None => {
                warn!("torrent absent from list after creation");
                Err(ProviderError::not_found(format!(
                    "torrent {info_hash} after submission"
                )))
            }
        }
    }
}
