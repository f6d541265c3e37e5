//! Wire types and raw endpoint calls for the provider boundary.
//!
//! One method per provider endpoint, each running under the client's
//! concurrency cap and classifying failures through [`ProviderError`]
//! before anything else in the crate sees them. The provider wraps every
//! payload in a `{ success, detail, data }` envelope and reports some auth
//! failures inside a 200 response, so the envelope is always inspected.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::status::{TorrentStatus, normalize};
use crate::client::{Credential, DebridClient};
use crate::error::ProviderError;

// ==================== Provider Wire Types ====================

/// The provider's standard response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: Option<bool>,
    pub detail: Option<String>,
    pub data: Option<T>,
}

/// One hash entry from a cache-availability check.
#[derive(Debug, Deserialize)]
pub(crate) struct CachedTorrent {
    pub hash: String,
    /// Deserialized for completeness; the availability probe keys on `hash`
    /// alone and file metadata is fetched authoritatively at resolve time.
    #[allow(dead_code)]
    pub files: Option<Vec<CachedFileEntry>>,
}

/// A file entry inside a cache-availability response.
#[derive(Debug, Deserialize)]
pub(crate) struct CachedFileEntry {
    #[allow(dead_code)]
    pub name: Option<String>,
    #[allow(dead_code)]
    pub size: Option<u64>,
}

/// The provider's record of a submitted torrent.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteTorrent {
    pub id: u64,
    pub hash: String,
    pub status: Option<String>,
    #[serde(default)]
    pub download_finished: bool,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

impl RemoteTorrent {
    /// Normalized lifecycle state of this torrent.
    pub(crate) fn torrent_status(&self) -> TorrentStatus {
        normalize(self.status.as_deref(), self.download_finished)
    }
}

/// A file inside a [`RemoteTorrent`]. Download links are absent until
/// explicitly requested via `request_download_link`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteFile {
    pub id: u64,
    pub short_name: String,
}

/// Node kind in the provider's hierarchical storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FolderNodeKind {
    Folder,
    File,
    #[serde(other)]
    Unknown,
}

/// A node in the provider's hierarchical storage.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteFolderNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FolderNodeKind,
}

/// Folder listings use a bare `content` array instead of the standard
/// envelope, but still report auth failures through a `detail` string.
#[derive(Debug, Deserialize)]
struct FolderListing {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    content: Vec<RemoteFolderNode>,
}

// ==================== Endpoint Calls ====================

impl DebridClient {
    /// Bulk cache-availability check for up to `batch_size` hashes.
    ///
    /// Returns the provider's entries for the hashes it holds complete
    /// copies of; absent hashes are simply missing from the result. A
    /// missing `data` field means no hash is cached.
    pub(crate) async fn check_cached(
        &self,
        info_hashes: &[&str],
        credential: &Credential,
    ) -> Result<Vec<CachedTorrent>, ProviderError> {
        let url = self.api_url("torrents/checkcached");
        let request = self
            .http
            .get(&url)
            .query(&[
                ("hash", info_hashes.join(",").as_str()),
                ("format", "list"),
                ("list_files", "true"),
            ])
            .bearer_auth(credential.secret());
        let envelope: Envelope<Vec<CachedTorrent>> =
            self.exchange("check_cached", request).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Lists the account's torrents, bypassing the provider's list cache so
    /// a just-created torrent shows up.
    pub(crate) async fn my_list(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RemoteTorrent>, ProviderError> {
        let url = self.api_url("torrents/mylist");
        let request = self
            .http
            .get(&url)
            .query(&[("bypass_cache", "true")])
            .bearer_auth(credential.secret());
        let envelope: Envelope<Vec<RemoteTorrent>> = self.exchange("my_list", request).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Submits a torrent by magnet link. The created record is not
    /// returned; callers re-list to retrieve it.
    pub(crate) async fn create_torrent(
        &self,
        magnet_link: &str,
        credential: &Credential,
    ) -> Result<(), ProviderError> {
        let url = self.api_url("torrents/createtorrent");
        let request = self
            .http
            .post(&url)
            .form(&[("magnet", magnet_link)])
            .bearer_auth(credential.secret());
        let _: Envelope<serde_json::Value> = self.exchange("create_torrent", request).await?;
        Ok(())
    }

    /// Requests a direct download link for one file of a torrent.
    pub(crate) async fn request_download_link(
        &self,
        torrent_id: u64,
        file_id: u64,
        credential: &Credential,
    ) -> Result<String, ProviderError> {
        let url = self.api_url("torrents/requestdl");
        let request = self.http.get(&url).query(&[
            ("token", credential.secret()),
            ("torrent_id", torrent_id.to_string().as_str()),
            ("file_id", file_id.to_string().as_str()),
            ("zip_link", "false"),
        ]);
        let envelope: Envelope<String> = self.exchange("request_download_link", request).await?;
        envelope
            .data
            .filter(|link| !link.is_empty())
            .ok_or_else(|| {
                ProviderError::not_found(format!(
                    "download link for file {file_id} of torrent {torrent_id}"
                ))
            })
    }

    /// Lists the immediate children of a remote folder.
    pub(crate) async fn list_folder(
        &self,
        folder_id: &str,
        credential: &Credential,
    ) -> Result<Vec<RemoteFolderNode>, ProviderError> {
        let operation = "list_folder";
        let url = self.api_url("folder/list");
        let request = self
            .http
            .get(&url)
            .query(&[("id", folder_id)])
            .bearer_auth(credential.secret());

        let _slot = self.acquire_slot(operation).await?;
        debug!(operation, folder_id, "calling provider");
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(operation, &e))?;
        Self::classify_error_status(operation, response.status().as_u16())?;
        let listing: FolderListing = response.json().await.map_err(|e| {
            ProviderError::unexpected(operation, &format!("malformed provider response: {e}"))
        })?;
        if let Some(classified) = listing.detail.as_deref().and_then(ProviderError::from_detail) {
            return Err(classified);
        }
        Ok(listing.content)
    }

    // ==================== Shared Plumbing ====================

    /// Sends one enveloped provider request under the concurrency cap and
    /// classifies every failure path.
    async fn exchange<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>, ProviderError> {
        let _slot = self.acquire_slot(operation).await?;
        debug!(operation, "calling provider");

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(operation, &e))?;

        let status = response.status().as_u16();
        if let Some(classified) = ProviderError::from_status(operation, status) {
            // The body's detail string is more precise than the bare status
            // when the provider explains itself.
            let refined = response
                .json::<Envelope<serde_json::Value>>()
                .await
                .ok()
                .and_then(|envelope| envelope.detail)
                .as_deref()
                .and_then(ProviderError::from_detail);
            debug!(operation, status, "provider returned error status");
            return Err(refined.unwrap_or(classified));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            ProviderError::unexpected(operation, &format!("malformed provider response: {e}"))
        })?;

        if let Some(classified) = envelope.detail.as_deref().and_then(ProviderError::from_detail) {
            return Err(classified);
        }
        if envelope.success == Some(false) {
            let detail = envelope
                .detail
                .as_deref()
                .unwrap_or("provider reported failure");
            return Err(ProviderError::unexpected(operation, detail));
        }
        Ok(envelope)
    }

    fn classify_error_status(operation: &'static str, status: u16) -> Result<(), ProviderError> {
        match ProviderError::from_status(operation, status) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DebridClient {
        DebridClient::with_base_url(server.uri()).unwrap()
    }

    // ==================== Serde Deserialization Tests ====================

    #[test]
    fn test_remote_torrent_deserialize_full() {
        let json = serde_json::json!({
            "id": 42,
            "hash": "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c",
            "status": "downloading",
            "download_finished": false,
            "files": [{"id": 0, "short_name": "movie.mkv"}]
        });
        let torrent: RemoteTorrent = serde_json::from_value(json).unwrap();
        assert_eq!(torrent.id, 42);
        assert_eq!(torrent.files[0].short_name, "movie.mkv");
        assert_eq!(torrent.torrent_status(), TorrentStatus::Downloading);
    }

    #[test]
    fn test_remote_torrent_deserialize_minimal() {
        let json = serde_json::json!({"id": 1, "hash": "abc"});
        let torrent: RemoteTorrent = serde_json::from_value(json).unwrap();
        assert!(!torrent.download_finished);
        assert!(torrent.files.is_empty());
        assert_eq!(torrent.torrent_status(), TorrentStatus::Downloading);
    }

    #[test]
    fn test_folder_node_kind_unknown_fallback() {
        let json = serde_json::json!({"id": "x", "name": "weird", "type": "symlink"});
        let node: RemoteFolderNode = serde_json::from_value(json).unwrap();
        assert_eq!(node.kind, FolderNodeKind::Unknown);
    }

    #[test]
    fn test_envelope_deserialize_without_success_field() {
        let json = serde_json::json!({"data": ["a"]});
        let envelope: Envelope<Vec<String>> = serde_json::from_value(json).unwrap();
        assert!(envelope.success.is_none());
        assert_eq!(envelope.data.unwrap(), vec!["a"]);
    }

    // ==================== Endpoint Tests (wiremock) ====================

    #[tokio::test]
    async fn test_check_cached_sends_csv_hashes_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/checkcached"))
            .and(query_param("hash", "aaa,bbb"))
            .and(query_param("format", "list"))
            .and(query_param("list_files", "true"))
            .and(header("authorization", "Bearer key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [{"hash": "aaa"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cached = client
            .check_cached(&["aaa", "bbb"], &Credential::new("key-1"))
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].hash, "aaa");
    }

    #[tokio::test]
    async fn test_check_cached_missing_data_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/checkcached"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "data": null})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cached = client
            .check_cached(&["aaa"], &Credential::new("k"))
            .await
            .unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_my_list_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/mylist"))
            .and(query_param("bypass_cache", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [{"id": 7, "hash": "aaa", "download_finished": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let torrents = client.my_list(&Credential::new("k")).await.unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].torrent_status(), TorrentStatus::Ready);
    }

    #[tokio::test]
    async fn test_create_torrent_posts_magnet_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/api/torrents/createtorrent"))
            .and(body_string_contains("magnet=magnet%3A%3Fxt%3Durn%3Abtih%3Aaaa"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .create_torrent("magnet:?xt=urn:btih:aaa", &Credential::new("k"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_download_link_returns_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/requestdl"))
            .and(query_param("torrent_id", "7"))
            .and(query_param("file_id", "3"))
            .and(query_param("zip_link", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": "https://cdn.example/file.mkv"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let link = client
            .request_download_link(7, 3, &Credential::new("k"))
            .await
            .unwrap();
        assert_eq!(link, "https://cdn.example/file.mkv");
    }

    #[tokio::test]
    async fn test_request_download_link_missing_data_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/requestdl"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.request_download_link(7, 3, &Credential::new("k")).await;
        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_exchange_classifies_401_as_auth_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/mylist"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.my_list(&Credential::new("expired")).await;
        assert!(matches!(result, Err(ProviderError::AuthenticationExpired)));
    }

    #[tokio::test]
    async fn test_exchange_classifies_detail_inside_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/mylist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "detail": "Not logged in."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.my_list(&Credential::new("expired")).await;
        assert!(matches!(result, Err(ProviderError::AuthenticationExpired)));
    }

    #[tokio::test]
    async fn test_exchange_refines_403_with_premium_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/requestdl"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "success": false,
                "detail": "Account not premium."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.request_download_link(1, 2, &Credential::new("free")).await;
        match result {
            Err(ProviderError::AccessDenied { detail }) => {
                assert_eq!(detail, "Account not premium.");
            }
            other => panic!("expected AccessDenied, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_success_false_without_detail_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/mylist"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.my_list(&Credential::new("k")).await;
        assert!(matches!(result, Err(ProviderError::Unexpected { .. })));
    }

    #[tokio::test]
    async fn test_exchange_malformed_json_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/torrents/mylist"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("not json")
                    .insert_header("content-type", "application/json"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.my_list(&Credential::new("k")).await;
        assert!(matches!(result, Err(ProviderError::Unexpected { .. })));
    }

    #[tokio::test]
    async fn test_list_folder_parses_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/folder/list"))
            .and(query_param("id", "root"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"id": "f1", "name": "Season 1", "type": "folder"},
                    {"id": "v1", "name": "e01.mkv", "type": "file"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let nodes = client.list_folder("root", &Credential::new("k")).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind, FolderNodeKind::Folder);
        assert_eq!(nodes[1].kind, FolderNodeKind::File);
    }

    #[tokio::test]
    async fn test_list_folder_missing_folder_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/api/folder/list"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.list_folder("gone", &Credential::new("k")).await;
        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
    }
}
