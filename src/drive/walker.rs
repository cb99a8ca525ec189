//! Depth-first cascades from a folder to everything below it.
//!
//! The walk follows `files.folder_id` and `folders.parent_id` links one level
//! at a time: files directly inside a folder are handled as one group, then
//! each subfolder is processed and descended into. Sibling order is whatever
//! the database returns.
//!
//! No step is rolled back. If a query or a content release fails halfway, the
//! items already visited keep their new state and the rest keep the old one.

use futures::future::BoxFuture;

use super::{entities, entities::State, now_millis, quota, Drive, DriveError, DriveResult, FileRecord};

/// Items whose trash flag a cascade wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub folders: u64,
    pub files: u64,
}

impl CascadeReport {
    fn merge(&mut self, other: CascadeReport) {
        self.folders += other.folders;
        self.files += other.files;
    }
}

/// What a permanent deletion removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub folders: u64,
    pub files: u64,
    /// Bytes given back to the owner's quota.
    pub bytes: i64,
}

impl PurgeReport {
    fn merge(&mut self, other: PurgeReport) {
        self.folders += other.folders;
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

impl Drive {
    /// Moves an active folder and everything below it to the trash.
    pub async fn cascade_trash(&self, owner: &str, folder_id: &str) -> DriveResult<CascadeReport> {
        let now = now_millis();
        let updated = entities::set_folder_trashed(&self.db, owner, folder_id, State::Active, Some(now)).await?;
        if updated == 0 {
            return Err(DriveError::NotFound("Folder"));
        }
        let mut report = CascadeReport { folders: 1, files: 0 };
        report.merge(self.flag_contents(owner, folder_id.to_string(), Some(now)).await?);
        tracing::info!(
            "Trashed folder {} with {} subfolder(s) and {} file(s)",
            folder_id,
            report.folders - 1,
            report.files
        );
        Ok(report)
    }

    /// Restores a trashed folder and everything below it.
    pub async fn cascade_restore(&self, owner: &str, folder_id: &str) -> DriveResult<CascadeReport> {
        let updated = entities::set_folder_trashed(&self.db, owner, folder_id, State::Trashed, None).await?;
        if updated == 0 {
            return Err(DriveError::NotFound("Folder"));
        }
        let mut report = CascadeReport { folders: 1, files: 0 };
        report.merge(self.flag_contents(owner, folder_id.to_string(), None).await?);
        tracing::info!(
            "Restored folder {} with {} subfolder(s) and {} file(s)",
            folder_id,
            report.folders - 1,
            report.files
        );
        Ok(report)
    }

    /// Permanently removes a folder in any state together with its subtree.
    ///
    /// Every file below it is released and refunded; every folder record is
    /// removed only after its own contents.
    pub async fn cascade_delete(&self, owner: &str, folder_id: &str) -> DriveResult<PurgeReport> {
        entities::find_folder(&self.db, owner, folder_id, State::Any)
            .await?
            .ok_or(DriveError::NotFound("Folder"))?;

        let mut report = self.purge_contents(owner, folder_id.to_string()).await?;
        entities::delete_folder_record(&self.db, owner, folder_id).await?;
        report.folders += 1;

        tracing::info!(
            "Purged folder {}: {} folder(s), {} file(s), {} bytes released",
            folder_id,
            report.folders,
            report.files,
            report.bytes
        );
        Ok(report)
    }

    /// Writes `trashed_at` (None = restore) to the files of `folder`, then to
    /// each subfolder and recursively to its contents.
    fn flag_contents<'a>(
        &'a self,
        owner: &'a str,
        folder: String,
        trashed_at: Option<i64>,
    ) -> BoxFuture<'a, DriveResult<CascadeReport>> {
        Box::pin(async move {
            let mut report = CascadeReport::default();
            report.files +=
                entities::set_files_trashed_in_folder(&self.db, owner, &folder, trashed_at, now_millis()).await?;

            for child in entities::child_folder_ids(&self.db, owner, &folder).await? {
                report.folders +=
                    entities::set_folder_trashed(&self.db, owner, &child, State::Any, trashed_at).await?;
                report.merge(self.flag_contents(owner, child, trashed_at).await?);
            }
            Ok(report)
        })
    }

    /// Purges the files of `folder`, then each subfolder's subtree followed by
    /// the subfolder record itself. `folder`'s own record is left to the caller.
    fn purge_contents<'a>(&'a self, owner: &'a str, folder: String) -> BoxFuture<'a, DriveResult<PurgeReport>> {
        Box::pin(async move {
            let mut report = PurgeReport::default();
            for file in entities::files_in_folder(&self.db, owner, &folder).await? {
                report.merge(self.purge_file(&file).await?);
            }

            for child in entities::child_folder_ids(&self.db, owner, &folder).await? {
                report.merge(self.purge_contents(owner, child.clone()).await?);
                report.folders += entities::delete_folder_record(&self.db, owner, &child).await?;
            }
            Ok(report)
        })
    }

    /// Releases a file's content, removes its record and refunds its size.
    ///
    /// Three separate writes: a crash between them leaves a record without
    /// content or a removed record whose size is still charged.
    pub(crate) async fn purge_file(&self, file: &FileRecord) -> DriveResult<PurgeReport> {
        if !self.content.release(&file.content_key).await? {
            tracing::warn!("Content {} of file {} was already gone", file.content_key, file.id);
        }

        let removed = entities::delete_file_record(&self.db, &file.owner_id, &file.id).await?;
        if removed == 0 {
            // Someone else purged it between our read and delete; they refunded it.
            return Ok(PurgeReport::default());
        }
        quota::refund(&self.db, &file.owner_id, file.size).await?;

        Ok(PurgeReport { folders: 0, files: 1, bytes: file.size })
    }
}
