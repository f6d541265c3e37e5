//! Recursive flattening of remote folder trees into video-file lists.
//!
//! The provider stores finished torrents as a folder hierarchy. The
//! flattener walks it iteratively (a frontier worklist, not recursion, so
//! depth is bounded by configuration rather than the stack), lists sibling
//! folders concurrently, and keeps only video files, each annotated with
//! the path reconstructed from folder names.

use futures_util::future::join_all;
use tracing::{debug, instrument, warn};

use crate::client::api::FolderNodeKind;
use crate::client::{Credential, DebridClient};
use crate::error::ProviderError;

/// A video file found in a remote folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// Provider-side file identifier.
    pub id: String,
    /// `/`-joined path from the root folder down to the file.
    pub name: String,
}

/// Extensions treated as video content; everything else is silently
/// excluded from flattened listings.
const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "divx", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ogv", "ts",
    "vob", "webm", "wmv",
];

/// Returns true when the filename carries a known video extension.
#[must_use]
pub fn is_video(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl DebridClient {
    /// Flattens the folder tree under `root_folder_id` into a list of
    /// video files with reconstructed paths.
    ///
    /// Return order is unspecified beyond every match being present
    /// exactly once. The walk stops at the configured maximum depth; the
    /// remote hierarchy is assumed acyclic but is not trusted to be.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when any folder listing fails.
    #[instrument(skip(self, credential))]
    pub async fn list_video_files(
        &self,
        root_folder_id: &str,
        credential: &Credential,
    ) -> Result<Vec<VideoFile>, ProviderError> {
        let mut videos = Vec::new();
        // Frontier of (folder id, path prefix); the root starts with an
        // empty prefix so a file one level down lists as "/name".
        let mut frontier = vec![(root_folder_id.to_string(), String::new())];

        for _depth in 0..self.config.max_folder_depth {
            if frontier.is_empty() {
                break;
            }
            let listings = join_all(
                frontier
                    .iter()
                    .map(|(folder_id, _)| self.list_folder(folder_id, credential)),
            )
            .await;

            let mut next_frontier = Vec::new();
            for ((_, prefix), listing) in frontier.iter().zip(listings) {
                for node in listing? {
                    let path = format!("{prefix}/{}", node.name);
                    match node.kind {
                        FolderNodeKind::Folder => next_frontier.push((node.id, path)),
                        FolderNodeKind::File if is_video(&node.name) => {
                            videos.push(VideoFile {
                                id: node.id,
                                name: path,
                            });
                        }
                        FolderNodeKind::File | FolderNodeKind::Unknown => {}
                    }
                }
            }
            frontier = next_frontier;
        }

        if !frontier.is_empty() {
            warn!(
                max_depth = self.config.max_folder_depth,
                unvisited = frontier.len(),
                "folder tree exceeds depth bound; truncating walk"
            );
        }
        debug!(videos = videos.len(), "flattened folder tree");
        Ok(videos)
    }
}
