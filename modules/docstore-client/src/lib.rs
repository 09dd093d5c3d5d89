pub mod error;
pub mod types;

pub use error::{DocstoreError, Result};
pub use types::{Folder, StoredDocument};

use std::path::Path;

use tracing::{debug, info};
use types::{DriveFile, FileList, FileMetadata};

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const DOC_MIME: &str = "application/vnd.google-apps.document";

/// Google Drive/Docs client.
///
/// Folder paths are slash-separated (`Lead_Reports/Jane Doe_Acme`); each
/// segment is created on demand. Document existence is checked by exact
/// title within a folder, which is what makes repeated saves idempotent.
pub struct DocstoreClient {
    client: reqwest::Client,
    token: String,
}

impl DocstoreClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DocstoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn find_child_folder(&self, parent: Option<&str>, name: &str) -> Result<Option<DriveFile>> {
        let escaped = name.replace('\'', "\\'");
        let mut query = format!("name='{escaped}' and mimeType='{FOLDER_MIME}' and trashed=false");
        if let Some(parent) = parent {
            query.push_str(&format!(" and '{parent}' in parents"));
        }

        let resp = self
            .client
            .get(format!("{DRIVE_API}/files"))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("pageSize", "1"),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;
        let list: FileList = Self::check(resp).await?.json().await?;
        Ok(list.files.into_iter().next())
    }

    async fn create_folder(&self, parent: Option<&str>, name: &str) -> Result<DriveFile> {
        let metadata = FileMetadata {
            name: name.to_string(),
            mime_type: Some(FOLDER_MIME.to_string()),
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        };
        let resp = self
            .client
            .post(format!("{DRIVE_API}/files"))
            .bearer_auth(&self.token)
            .query(&[("fields", "id, name")])
            .json(&metadata)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Grant anyone-with-link read access. Returns the shareable link.
    async fn make_shareable(&self, file_id: &str) -> Result<String> {
        let resp = self
            .client
            .post(format!("{DRIVE_API}/files/{file_id}/permissions"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;
        Self::check(resp).await?;

        let resp = self
            .client
            .get(format!("{DRIVE_API}/files/{file_id}"))
            .bearer_auth(&self.token)
            .query(&[("fields", "id, webViewLink")])
            .send()
            .await?;
        let file: DriveFile = Self::check(resp).await?.json().await?;
        Ok(file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{file_id}")))
    }

    /// Resolve a slash-separated folder path, creating missing segments.
    pub async fn ensure_folder(&self, path: &str, shareable: bool) -> Result<Folder> {
        let mut parent: Option<String> = None;
        let mut folder_id = String::new();

        for segment in path.split('/').filter(|s| !s.trim().is_empty()) {
            let existing = self.find_child_folder(parent.as_deref(), segment).await?;
            let folder = match existing {
                Some(folder) => folder,
                None => {
                    debug!(segment, "Creating store folder segment");
                    self.create_folder(parent.as_deref(), segment).await?
                }
            };
            folder_id = folder.id.clone();
            parent = Some(folder.id);
        }

        if shareable && !folder_id.is_empty() {
            // The folder already exists at this point; sharing failures are logged only.
            if let Err(e) = self.make_shareable(&folder_id).await {
                tracing::warn!(path, error = %e, "Failed to make folder shareable");
            }
        }

        Ok(Folder {
            url: format!("https://drive.google.com/drive/folders/{folder_id}"),
            id: folder_id,
        })
    }

    /// Exact title + folder existence check.
    pub async fn document_exists(&self, folder_path: &str, title: &str) -> Result<bool> {
        if title.is_empty() {
            return Ok(false);
        }
        let folder = self.ensure_folder(folder_path, false).await?;
        let escaped = title.replace('\'', "\\'");
        let query = format!(
            "name='{escaped}' and '{}' in parents and trashed=false",
            folder.id
        );

        let resp = self
            .client
            .get(format!("{DRIVE_API}/files"))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("pageSize", "1"),
                ("fields", "files(id)"),
            ])
            .send()
            .await?;
        let list: FileList = Self::check(resp).await?.json().await?;
        Ok(!list.files.is_empty())
    }

    /// Create a document in a folder. Markdown content is converted by the
    /// store into a native document.
    pub async fn create_document(
        &self,
        content: &str,
        title: &str,
        folder_path: &str,
        markdown: bool,
        shareable: bool,
    ) -> Result<StoredDocument> {
        let folder = self.ensure_folder(folder_path, false).await?;

        let metadata = FileMetadata {
            name: title.to_string(),
            mime_type: Some(DOC_MIME.to_string()),
            parents: vec![folder.id.clone()],
        };
        let media_type = if markdown { "text/markdown" } else { "text/plain" };

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(serde_json::to_string(&metadata)?)
                    .mime_str("application/json; charset=UTF-8")
                    .map_err(|e| DocstoreError::Parse(e.to_string()))?,
            )
            .part(
                "media",
                reqwest::multipart::Part::text(content.to_string())
                    .mime_str(media_type)
                    .map_err(|e| DocstoreError::Parse(e.to_string()))?,
            );

        let resp = self
            .client
            .post(format!("{DRIVE_UPLOAD_API}/files"))
            .bearer_auth(&self.token)
            .query(&[("uploadType", "multipart"), ("fields", "id, name")])
            .multipart(form)
            .send()
            .await?;
        let file: DriveFile = Self::check(resp).await?.json().await?;

        let shareable_url = if shareable {
            Some(self.make_shareable(&file.id).await?)
        } else {
            None
        };

        info!(title, folder = folder_path, "Document created in store");
        Ok(StoredDocument {
            document_url: format!("https://docs.google.com/document/d/{}", file.id),
            shareable_url,
            folder_url: folder.url,
        })
    }

    /// Upload a local file as-is into a folder. Returns its link.
    pub async fn upload_file(
        &self,
        path: &Path,
        name: &str,
        folder_path: &str,
        shareable: bool,
    ) -> Result<String> {
        let folder = self.ensure_folder(folder_path, false).await?;
        let bytes = tokio::fs::read(path).await?;

        let metadata = FileMetadata {
            name: name.to_string(),
            mime_type: None,
            parents: vec![folder.id],
        };

        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(serde_json::to_string(&metadata)?)
                    .mime_str("application/json; charset=UTF-8")
                    .map_err(|e| DocstoreError::Parse(e.to_string()))?,
            )
            .part("media", reqwest::multipart::Part::bytes(bytes));

        let resp = self
            .client
            .post(format!("{DRIVE_UPLOAD_API}/files"))
            .bearer_auth(&self.token)
            .query(&[("uploadType", "multipart"), ("fields", "id, webViewLink")])
            .multipart(form)
            .send()
            .await?;
        let file: DriveFile = Self::check(resp).await?.json().await?;

        if shareable {
            return self.make_shareable(&file.id).await;
        }
        Ok(file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}", file.id)))
    }
}
