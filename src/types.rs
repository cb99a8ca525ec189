use serde::{Deserialize, Serialize};

use crate::drive::{Contents, Entry, FileRecord, Folder, PurgeReport, User};

/// Unix milliseconds as RFC 3339, the timestamp format of every response.
pub fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339()).unwrap_or_default()
}

// Requests

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub storage_used: i64,
    pub storage_limit: i64,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            storage_used: u.storage_used,
            storage_limit: u.storage_limit,
            created_at: format_millis(u.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderDto {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub is_trashed: bool,
    pub trashed_at: Option<String>,
    pub created_at: String,
}

impl From<Folder> for FolderDto {
    fn from(f: Folder) -> Self {
        Self {
            id: f.id,
            name: f.name,
            parent_id: f.parent_id,
            is_trashed: f.is_trashed,
            trashed_at: f.trashed_at.map(format_millis),
            created_at: format_millis(f.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDto {
    pub id: String,
    pub name: String,
    pub folder_id: Option<String>,
    pub size: i64,
    pub mime_type: String,
    pub is_trashed: bool,
    pub trashed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FileRecord> for FileDto {
    fn from(f: FileRecord) -> Self {
        Self {
            id: f.id,
            name: f.name,
            folder_id: f.folder_id,
            size: f.size,
            mime_type: f.mime_type,
            is_trashed: f.is_trashed,
            trashed_at: f.trashed_at.map(format_millis),
            created_at: format_millis(f.created_at),
            updated_at: format_millis(f.updated_at),
        }
    }
}

/// A file or folder after a state change, tagged with its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryDto {
    File(FileDto),
    Folder(FolderDto),
}

impl From<Entry> for EntryDto {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::File(f) => EntryDto::File(f.into()),
            Entry::Folder(f) => EntryDto::Folder(f.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentsDto {
    pub folders: Vec<FolderDto>,
    pub files: Vec<FileDto>,
}

impl From<Contents> for ContentsDto {
    fn from(c: Contents) -> Self {
        Self {
            folders: c.folders.into_iter().map(Into::into).collect(),
            files: c.files.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<FileDto>,
    pub total_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub deleted_files: u64,
    pub deleted_folders: u64,
    pub freed_bytes: i64,
}

impl From<PurgeReport> for PurgeResponse {
    fn from(r: PurgeReport) -> Self {
        Self { deleted_files: r.files, deleted_folders: r.folders, freed_bytes: r.bytes }
    }
}
