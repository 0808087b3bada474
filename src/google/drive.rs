use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::config::GoogleConfig;
use crate::deal::FolderStore;
use crate::error::{BotError, Result};
use crate::google::auth::TokenSource;

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const ITEM_FIELDS: &str = "id,name,webViewLink";
const LIST_FIELDS: &str = "files(id,name,webViewLink)";

/// A file or folder as returned by Drive with `fields=id,name,webViewLink`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveItem>,
}

/// Escapes a value for use inside single quotes in a Drive `q` expression.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn folder_query(name: &str, parent_id: &str) -> String {
    format!(
        "mimeType='{}' and trashed=false and '{}' in parents and name='{}'",
        FOLDER_MIME,
        escape_query_value(parent_id),
        escape_query_value(name)
    )
}

/// Content type for an upload, guessed from the file extension.
pub fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Builds a `multipart/related` body: JSON metadata part followed by the media part.
fn multipart_related(boundary: &str, metadata: &serde_json::Value, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {mime}\r\n\r\n",
            b = boundary,
            meta = metadata,
            mime = mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Google Drive v3 REST client, shared-drive aware.
pub struct DriveClient {
    http: reqwest::Client,
    auth: Arc<dyn TokenSource>,
    api_url: String,
    upload_url: String,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, auth: Arc<dyn TokenSource>, config: &GoogleConfig) -> Self {
        Self {
            http,
            auth,
            api_url: config.drive_api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_api_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<DriveItem>> {
        let token = self.auth.access_token().await?;
        let query = folder_query(name, parent_id);

        let response = self
            .http
            .get(format!("{}/files", self.api_url))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next())
    }

    pub async fn create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(format!("{}/files", self.api_url))
            .bearer_auth(token)
            .query(&[("fields", ITEM_FIELDS), ("supportsAllDrives", "true")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent_id],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }

        let folder: DriveItem = response.json().await?;
        debug!("Created folder '{}' ({}) in {}", name, folder.id, parent_id);
        Ok(folder)
    }
}

#[async_trait]
impl FolderStore for DriveClient {
    async fn get_or_create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem> {
        match self.find_folder(name, parent_id).await? {
            Some(existing) => {
                debug!("Reusing folder '{}' ({})", name, existing.id);
                Ok(existing)
            }
            None => self.create_folder(name, parent_id).await,
        }
    }

    async fn upload_file(&self, parent_id: &str, filename: &str, data: Vec<u8>) -> Result<DriveItem> {
        let token = self.auth.access_token().await?;
        let boundary = format!(
            "brandcomm-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let metadata = json!({ "name": filename, "parents": [parent_id] });
        let body = multipart_related(&boundary, &metadata, guess_mime(filename), &data);

        let response = self
            .http
            .post(format!("{}/files", self.upload_url))
            .bearer_auth(token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", ITEM_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }

        Ok(response.json().await?)
    }
}
