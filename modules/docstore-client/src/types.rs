use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// A folder resolved or created in the store.
#[derive(Debug, Clone)]
pub struct Folder {
    pub id: String,
    pub url: String,
}

/// A document persisted to the store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document_url: String,
    pub shareable_url: Option<String>,
    pub folder_url: String,
}
