//! "Recently used" tracking.
//!
//! Recency is `updated_at`, which rename, trash and restore touch as well, so
//! the recent list means "last touched in any way" rather than "last opened".
//! Timestamps have millisecond resolution; an access in the same millisecond
//! as a later upload does not move the accessed file ahead, since ties fall
//! back to insertion order.

use std::io;

use super::{entities, now_millis, Drive, DriveError, DriveResult, FileRecord};
use crate::content::ContentReader;

impl Drive {
    /// Sets the file's `updated_at` to now and returns the updated record.
    pub async fn record_access(&self, owner: &str, file_id: &str) -> DriveResult<FileRecord> {
        if entities::touch_file(&self.db, owner, file_id, now_millis()).await? == 0 {
            return Err(DriveError::NotFound("File"));
        }
        self.find_file(owner, file_id).await
    }

    /// At most `limit` non-trashed files, most recently touched first.
    pub async fn list_recent(&self, owner: &str, limit: i64) -> DriveResult<Vec<FileRecord>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        entities::recent_files(&self.db, owner, limit).await
    }

    /// Opens a file's content for download and counts it as an access.
    pub async fn open_content(&self, owner: &str, file_id: &str) -> DriveResult<(FileRecord, ContentReader)> {
        let file = self.find_file(owner, file_id).await?;
        let reader = match self.content.open(&file.content_key).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Content {} of file {} is missing", file.content_key, file.id);
                return Err(DriveError::NotFound("File content"));
            }
            Err(e) => return Err(e.into()),
        };
        let file = self.record_access(owner, file_id).await?;
        Ok((file, reader))
    }
}
