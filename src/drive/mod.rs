//! The storage core: users' files and folders, the trash lifecycle and
//! quota accounting.
//!
//! Every operation takes the owner id explicitly and scopes its lookups by it,
//! so an item owned by someone else is indistinguishable from a missing one.
//!
//! Item states:
//!
//! ```text
//!   ACTIVE --move_to_trash--> TRASHED --restore--> ACTIVE
//!      |                         |
//!      +---delete_permanently----+--> PURGED (record removed, content released)
//! ```
//!
//! Folder transitions cascade through the [`walker`]. `storage_used` is only
//! changed by uploads ([`upload`]) and purges; trash and restore leave it alone.
//!
//! Cascades are not wrapped in a transaction. A walk that fails halfway leaves
//! the subtree in a mixed state, and a purge may release content and remove a
//! record without the matching quota decrement if the process dies between
//! the two writes.

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::content::ContentStore;

pub mod access;
pub mod entities;
pub mod lifecycle;
pub mod quota;
pub mod upload;
pub mod walker;

pub use entities::{FileRecord, Folder, User};
pub use lifecycle::{Contents, Entry};
pub use upload::StagedFile;
pub use walker::{CascadeReport, PurgeReport};

const MAX_NAME_LEN: usize = 255;

/// Failures raised by the storage core.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Item missing, owned by someone else, or in the wrong state.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The upload batch would push the owner past their storage limit.
    #[error("storage limit exceeded: {requested} bytes requested, {used} of {limit} bytes used")]
    QuotaExceeded { requested: i64, used: i64, limit: i64 },

    /// A required field is missing or malformed.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// The acting user does not exist.
    #[error("owner does not exist")]
    InvalidOwner,

    /// Reading, writing or releasing stored content failed.
    #[error("content store error: {0}")]
    Content(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// A file or folder addressed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    File(String),
    Folder(String),
}

/// Handle to the storage core: the database plus the content store.
#[derive(Clone)]
pub struct Drive {
    pub(crate) db: SqlitePool,
    pub(crate) content: Arc<dyn ContentStore>,
}

impl Drive {
    pub fn new(db: SqlitePool, content: Arc<dyn ContentStore>) -> Self {
        Self { db, content }
    }
}

/// Current time as unix milliseconds, the timestamp format of every table.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trims and validates a user supplied file or folder name.
pub fn validate_name(name: &str) -> DriveResult<String> {
    let trimmed = name.trim();
    let invalid = |message: &str| DriveError::InvalidInput { field: "name".to_string(), message: message.to_string() };
    if trimmed.is_empty() {
        return Err(invalid("name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if trimmed.contains(['/', '\\', '\0']) {
        return Err(invalid("name must not contain path separators or null bytes"));
    }
    Ok(trimmed.to_string())
}
