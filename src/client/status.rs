//! Normalization of the provider's torrent-status vocabulary.
//!
//! The provider reports progress as a free-form status string plus a
//! `download_finished` flag. This module folds that into a closed,
//! exhaustively-matched enum so the state machine never branches on raw
//! strings. Unrecognized vocabulary maps to [`TorrentStatus::Unknown`]
//! rather than silently being treated as any concrete state.

/// Normalized lifecycle state of a provider-side torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentStatus {
    /// The provider holds a complete copy; files can be requested.
    Ready,
    /// The provider is still fetching the torrent.
    Downloading,
    /// The provider gave up on the torrent; re-submission may help.
    Errored,
    /// The provider reported vocabulary this crate does not recognize.
    Unknown,
}

/// Status strings the provider uses for torrents it has given up on.
const ERRORED_STATUSES: &[&str] = &["deleted", "error", "timeout", "failed"];

/// Status strings the provider uses while a torrent is still in flight.
const DOWNLOADING_STATUSES: &[&str] = &[
    "downloading",
    "queued",
    "paused",
    "stalled",
    "stalled (no seeds)",
    "metadl",
    "checkingresumedata",
    "processing",
    "uploading",
    "completed",
    "cached",
];

/// Normalizes a raw provider status into [`TorrentStatus`].
///
/// The errored vocabulary wins over the finished flag: a torrent the
/// provider has deleted is not ready no matter what the flag says. A
/// missing status string with the flag unset means the provider is still
/// working, which is how it reports freshly-created torrents.
#[must_use]
pub(crate) fn normalize(status: Option<&str>, download_finished: bool) -> TorrentStatus {
    let lowered = status.map(str::trim).map(str::to_ascii_lowercase);

    if let Some(ref s) = lowered
        && ERRORED_STATUSES.contains(&s.as_str())
    {
        return TorrentStatus::Errored;
    }
    if download_finished {
        return TorrentStatus::Ready;
    }
    match lowered {
        None => TorrentStatus::Downloading,
        Some(ref s) if DOWNLOADING_STATUSES.contains(&s.as_str()) => TorrentStatus::Downloading,
        Some(_) => TorrentStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_finished_is_ready() {
        assert_eq!(normalize(None, true), TorrentStatus::Ready);
        assert_eq!(normalize(Some("completed"), true), TorrentStatus::Ready);
    }

    #[test]
    fn test_normalize_errored_vocabulary() {
        for status in ["deleted", "error", "timeout", "failed"] {
            assert_eq!(
                normalize(Some(status), false),
                TorrentStatus::Errored,
                "'{status}' should normalize to Errored"
            );
        }
    }

    #[test]
    fn test_normalize_errored_wins_over_finished_flag() {
        assert_eq!(normalize(Some("deleted"), true), TorrentStatus::Errored);
    }

    #[test]
    fn test_normalize_downloading_vocabulary() {
        for status in ["downloading", "queued", "stalled", "metaDL"] {
            assert_eq!(
                normalize(Some(status), false),
                TorrentStatus::Downloading,
                "'{status}' should normalize to Downloading"
            );
        }
    }

    #[test]
    fn test_normalize_missing_status_unfinished_is_downloading() {
        assert_eq!(normalize(None, false), TorrentStatus::Downloading);
    }

    #[test]
    fn test_normalize_unrecognized_is_unknown() {
        assert_eq!(normalize(Some("transmogrifying"), false), TorrentStatus::Unknown);
    }

    #[test]
    fn test_normalize_trims_and_ignores_case() {
        assert_eq!(normalize(Some("  DELETED "), false), TorrentStatus::Errored);
        assert_eq!(normalize(Some("Queued"), false), TorrentStatus::Downloading);
    }
}
