//! Debrid provider client core.
//!
//! This library resolves a torrent (identified by its info-hash and a
//! target file within it) to a playable media link by consulting a remote
//! debrid caching service, and reports cache availability for batches of
//! candidate torrents before a user commits to one. The provider is slow,
//! rate-limited, and charges one request per lookup, so batching and
//! bounded retry matter throughout.
//!
//! # Architecture
//!
//! - [`availability`] - Batched cache-availability probing
//! - [`resolve`] - The find-or-create-or-retry resolution state machine
//! - [`folder`] - Recursive flattening of remote folder trees into video lists
//! - [`client`] - Provider client, configuration, and wire boundary
//! - [`error`] - Classified provider errors
//! - [`magnet`] - Magnet-link resolution seam for torrent submission
//!
//! # Example
//!
//! ```no_run
//! use debrid_core::{CandidateStream, Credential, DebridClient, ResolutionOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DebridClient::new(Default::default())?;
//! let credential = Credential::new("api-key");
//!
//! let streams = vec![CandidateStream::new(
//!     "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c",
//!     0,
//!     "movie.mkv",
//! )];
//! let availability = client.check_availability(&streams, &credential).await?;
//! println!("{} candidates probed", availability.len());
//!
//! match client
//!     .resolve("dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c", "movie.mkv", &credential)
//!     .await?
//! {
//!     ResolutionOutcome::DirectLink(url) => println!("play: {url}"),
//!     other => println!("not playable yet: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod availability;
pub mod client;
pub mod error;
pub mod folder;
mod http;
pub mod magnet;
pub mod resolve;

// Re-export commonly used types
pub use availability::{CacheEntry, CandidateStream, StreamKey};
pub use client::{Credential, DebridClient, ProviderConfig, TorrentStatus};
pub use error::ProviderError;
pub use folder::{VideoFile, is_video};
pub use magnet::{MagnetResolver, TrackerlessMagnet};
pub use resolve::ResolutionOutcome;
