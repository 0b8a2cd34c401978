//! Google Drive API client.
//!
//! Every operation resolves one endpoint, attaches the stored bearer token,
//! sends exactly one request and decodes the answer. Nothing is retried,
//! cached or paginated behind the caller's back.

use bytes::Bytes;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use drivekit_common::{Credential, Error, Result};

use crate::config::DriveConfig;
use crate::endpoints::{Endpoint, PathParams};
use crate::params::{CopyRequest, ListParams, MetadataUpdate, MoveParams, NewPermission, UploadMetadata};
use crate::query::{DriveQuery, ItemKind, MatchMode, Parent};
use crate::token::TokenStore;
use crate::types::{About, DriveFile, ErrorEnvelope, FileList, Permission, PermissionList};

/// Google Drive API client.
///
/// Owns its configuration and its credential slot, so independent clients
/// act as independent sessions.
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    tokens: TokenStore,
}

impl DriveClient {
    /// Create a new Drive client.
    ///
    /// # Errors
    /// - `Network` if the HTTP client cannot be constructed
    pub fn new(config: DriveConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_http_client(config, http))
    }

    /// Create a client on top of an existing HTTP client.
    pub fn with_http_client(config: DriveConfig, http: Client) -> Self {
        Self {
            http,
            config,
            tokens: TokenStore::new(),
        }
    }

    /// Builder form of [`DriveClient::set_token`].
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.set_token(credential);
        self
    }

    /// Store the credential used for subsequent calls, replacing any previous one.
    pub fn set_token(&mut self, credential: Credential) {
        self.tokens.set(credential);
    }

    /// The stored credential.
    ///
    /// # Errors
    /// - `Unauthenticated` if none has been set
    pub fn token(&self) -> Result<&Credential> {
        self.tokens.get()
    }

    /// Forget the stored credential.
    pub fn clear_token(&mut self) -> Option<Credential> {
        self.tokens.clear()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// List files and folders.
    ///
    /// Returns a single page; follow `next_page_token` to continue.
    pub async fn list(&self, params: &ListParams) -> Result<FileList> {
        let request = self
            .request(Method::GET, Endpoint::FilesList, &PathParams::none())?
            .query(params);

        self.send_json(request, "list files").await
    }

    /// List non-folder items directly inside a folder.
    pub async fn list_files_in_folder(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileList> {
        let query = DriveQuery::new().in_folder(folder_id).kind(ItemKind::Files);
        self.list(&page(ListParams::query(&query), page_token)).await
    }

    /// List folders directly inside a folder.
    pub async fn list_folders_in_folder(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileList> {
        let query = DriveQuery::new().in_folder(folder_id).kind(ItemKind::Folders);
        self.list(&page(ListParams::query(&query), page_token)).await
    }

    /// Find files by name, optionally within one parent folder.
    pub async fn find_by_name(
        &self,
        parent: Parent,
        name: &str,
        mode: MatchMode,
    ) -> Result<FileList> {
        let query = DriveQuery::new()
            .parent(parent)
            .kind(ItemKind::Files)
            .name(name, mode);
        self.list(&ListParams::query(&query)).await
    }

    /// Copy a file.
    pub async fn copy(&self, file_id: &str, body: &CopyRequest) -> Result<DriveFile> {
        let request = self
            .request(Method::POST, Endpoint::FilesCopy, &PathParams::file(file_id))?
            .json(body);

        self.send_json(request, "copy file").await
    }

    /// Delete a file permanently, bypassing the trash.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, Endpoint::FilesDelete, &PathParams::file(file_id))?;

        self.send(request, "delete file").await?;
        Ok(())
    }

    /// Download file content.
    pub async fn download(&self, file_id: &str) -> Result<Bytes> {
        let request = self
            .request(Method::GET, Endpoint::FilesGet, &PathParams::file(file_id))?
            .query(&[("alt", "media"), ("acknowledgeAbuse", "false")]);

        let response = self.send(request, "download file").await?;
        response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read download response: {}", e)))
    }

    /// Get file metadata by ID.
    pub async fn get_metadata(&self, file_id: &str, fields: Option<&str>) -> Result<DriveFile> {
        let mut request = self.request(Method::GET, Endpoint::FilesGet, &PathParams::file(file_id))?;
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }

        self.send_json(request, "get file").await
    }

    /// Upload raw bytes as a new file.
    ///
    /// Drive names the file "Untitled"; use [`DriveClient::upload_with_metadata`]
    /// to set a name or parent in the same request.
    pub async fn upload(&self, data: Vec<u8>, content_type: &str) -> Result<DriveFile> {
        let request = self
            .request(Method::POST, Endpoint::UploadFilesCreate, &PathParams::none())?
            .query(&[("uploadType", "media")])
            .header(header::CONTENT_TYPE, content_type)
            .body(data);

        self.send_json(request, "upload file").await
    }

    /// Upload bytes together with their metadata as a single multipart request.
    pub async fn upload_with_metadata(
        &self,
        metadata: &UploadMetadata,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<DriveFile> {
        let metadata_json = serde_json::to_vec(metadata)
            .map_err(|e| Error::Serialization(format!("Failed to serialize metadata: {}", e)))?;

        let boundary = format!("drivekit-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata_json, &data, content_type);

        let request = self
            .request(Method::POST, Endpoint::UploadFilesCreate, &PathParams::none())?
            .query(&[("uploadType", "multipart")])
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);

        self.send_json(request, "upload file").await
    }

    /// Move a file by adding and/or removing parent folders.
    pub async fn move_file(&self, file_id: &str, params: &MoveParams) -> Result<DriveFile> {
        let request = self
            .request(Method::PATCH, Endpoint::FilesUpdate, &PathParams::file(file_id))?
            .query(params);

        self.send_json(request, "move file").await
    }

    /// Update file metadata.
    pub async fn update_metadata(&self, file_id: &str, update: &MetadataUpdate) -> Result<DriveFile> {
        let request = self
            .request(Method::PATCH, Endpoint::FilesUpdate, &PathParams::file(file_id))?
            .json(update);

        self.send_json(request, "update file metadata").await
    }

    /// Information about the user and their storage.
    ///
    /// The API requires an explicit selector, e.g. `user,storageQuota`.
    pub async fn about(&self, fields: &str) -> Result<About> {
        let request = self
            .request(Method::GET, Endpoint::About, &PathParams::none())?
            .query(&[("fields", fields)]);

        self.send_json(request, "get about").await
    }

    /// Share a file.
    pub async fn create_permission(
        &self,
        file_id: &str,
        permission: &NewPermission,
    ) -> Result<Permission> {
        let request = self
            .request(Method::POST, Endpoint::PermissionsCreate, &PathParams::file(file_id))?
            .json(permission);

        self.send_json(request, "create permission").await
    }

    /// Get a single permission.
    pub async fn get_permission(&self, file_id: &str, permission_id: &str) -> Result<Permission> {
        let request = self.request(
            Method::GET,
            Endpoint::PermissionsGet,
            &PathParams::permission(file_id, permission_id),
        )?;

        self.send_json(request, "get permission").await
    }

    /// List the permissions of a file.
    pub async fn list_permissions(&self, file_id: &str) -> Result<PermissionList> {
        let request = self
            .request(Method::GET, Endpoint::PermissionsList, &PathParams::file(file_id))?
            .query(&[("fields", "permissions(id,role,type,emailAddress,domain),nextPageToken")]);

        self.send_json(request, "list permissions").await
    }

    /// Remove a permission.
    pub async fn delete_permission(&self, file_id: &str, permission_id: &str) -> Result<()> {
        let request = self.request(
            Method::DELETE,
            Endpoint::PermissionsDelete,
            &PathParams::permission(file_id, permission_id),
        )?;

        self.send(request, "delete permission").await?;
        Ok(())
    }

    /// Start an authorized request.
    ///
    /// Fails before any network I/O when no credential is stored.
    fn request(
        &self,
        method: Method,
        endpoint: Endpoint,
        params: &PathParams<'_>,
    ) -> Result<RequestBuilder> {
        let credential = self.tokens.get()?;
        let url = self.config.endpoints.url(endpoint, params)?;

        debug!(method = %method, endpoint = endpoint.key(), "Drive API request");

        Ok(self
            .http
            .request(method, url)
            .header(header::AUTHORIZATION, credential.authorization_header()))
    }

    /// Send a request and reject non-success statuses.
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to {}: {}", action, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                Bytes::new()
            }
        };
        let err = api_error(status, &body);
        debug!(status = status.as_u16(), error = %err, "Drive API call failed");
        Err(err)
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
        let response = self.send(request, action).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;

        serde_json::from_slice(&body)
            .map_err(|e| Error::Decode(format!("Failed to parse {} response: {}", action, e)))
    }
}

fn page(params: ListParams, page_token: Option<&str>) -> ListParams {
    match page_token {
        Some(token) => params.with_page_token(token),
        None => params,
    }
}

/// Turn a failed response into an [`Error::Api`].
///
/// The message comes from `error.message` of the JSON body; bodies without
/// one fall back to the status reason phrase.
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

/// Build a `multipart/related` body with a JSON metadata part and a media part.
fn multipart_related(boundary: &str, metadata_json: &[u8], data: &[u8], content_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata_json.len() + data.len() + 256);

    // Metadata part
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json);
    body.extend_from_slice(b"\r\n");

    // Data part
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}--", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> DriveClient {
        // Port 9 (discard) on loopback; nothing should ever be sent there.
        let config = DriveConfig::default().with_bases("http://127.0.0.1:9", "http://127.0.0.1:9");
        DriveClient::new(config).unwrap()
    }

    #[test]
    fn test_api_error_uses_server_message() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            br#"{"error":{"code":404,"message":"Not Found","errors":[]}}"#,
        );
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_api_error_keeps_message_verbatim() {
        let err = api_error(
            StatusCode::FORBIDDEN,
            br#"{"error":{"message":"The user does not have sufficient permissions for this file."}}"#,
        );
        assert_eq!(
            err.to_string(),
            "The user does not have sufficient permissions for this file."
        );
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>upstream</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert_eq!(err.status(), Some(502));

        let err = api_error(StatusCode::from_u16(599).unwrap(), b"");
        assert_eq!(err.to_string(), "HTTP 599");
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related("B", br#"{"name":"a"}"#, b"hello", "text/plain");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--B\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"a\"}\r\n\
             --B\r\nContent-Type: text/plain\r\n\r\nhello\r\n--B--"
        );
    }

    #[test]
    fn test_credential_management() {
        let mut client = unreachable_client();
        assert!(matches!(client.token(), Err(Error::Unauthenticated)));

        client.set_token(Credential::bearer("one"));
        client.set_token(Credential::bearer("two"));
        assert_eq!(client.token().unwrap().access_token, "two");

        assert!(client.clear_token().is_some());
        assert!(matches!(client.token(), Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_operations_require_credential() {
        let client = unreachable_client();

        assert!(matches!(
            client.list(&ListParams::default()).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            client.copy("F", &CopyRequest::default()).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(client.delete("F").await, Err(Error::Unauthenticated)));
        assert!(matches!(client.download("F").await, Err(Error::Unauthenticated)));
        assert!(matches!(
            client.upload(b"x".to_vec(), "text/plain").await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            client.move_file("F", &MoveParams::default()).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            client.update_metadata("F", &MetadataUpdate::default()).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(client.about("user").await, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_configuration_error() {
        let mut config = DriveConfig::default();
        config.endpoints = crate::endpoints::EndpointTable::empty();
        let client = DriveClient::new(config)
            .unwrap()
            .with_credential(Credential::bearer("t"));

        let err = client.list(&ListParams::default()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
