//! Uploads: content is staged first, then the whole batch is accepted or
//! rejected against the owner's quota.
//!
//! A rejected batch (quota, unknown folder, database failure) releases every
//! staged content blob before the error is returned, so nothing of it remains.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use super::{entities, entities::State, now_millis, quota, validate_name, Drive, DriveError, DriveResult, FileRecord};
use crate::content::new_content_key;

const STAGE_BUFFER_SIZE: usize = 64 * 1024;

/// Content that has been written to the content store but not yet recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub content_key: String,
    pub size: i64,
    pub mime_type: String,
}

impl Drive {
    /// Streams `reader` into the content store.
    ///
    /// Fails with `InvalidInput` once more than `max_bytes` arrive; whatever was
    /// written so far is released.
    pub async fn stage<R>(
        &self,
        name: &str,
        mime_type: Option<&str>,
        reader: R,
        max_bytes: u64,
    ) -> DriveResult<StagedFile>
    where
        R: AsyncRead + Send,
    {
        let name = validate_name(name)?;
        let content_key = new_content_key(&name);
        let mut writer = self.content.create(&content_key).await?;
        tokio::pin!(reader);

        let mut buf = vec![0u8; STAGE_BUFFER_SIZE];
        let mut size: u64 = 0;
        let written = async {
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                size += n as u64;
                if size > max_bytes {
                    return Err(DriveError::InvalidInput {
                        field: "files".to_string(),
                        message: format!("{} exceeds the maximum file size of {} bytes", name, max_bytes),
                    });
                }
                writer.write_all(&buf[..n]).await?;
            }
            writer.shutdown().await?;
            Ok::<(), DriveError>(())
        }
        .await;
        drop(writer);

        if let Err(e) = written {
            if let Err(release_err) = self.content.release(&content_key).await {
                tracing::warn!("Failed to release partial upload {}: {}", content_key, release_err);
            }
            return Err(e);
        }

        let mime_type = match mime_type.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.to_string(),
            None => mime_guess::from_path(&name).first_or_octet_stream().essence_str().to_string(),
        };

        Ok(StagedFile { name, content_key, size: size as i64, mime_type })
    }

    /// Records a staged batch for `owner`, optionally inside `folder_id`.
    ///
    /// The batch is all or nothing: on any failure no record is created,
    /// `storage_used` is untouched and the staged content is released.
    pub async fn upload_files(
        &self,
        owner: &str,
        staged: Vec<StagedFile>,
        folder_id: Option<&str>,
    ) -> DriveResult<Vec<FileRecord>> {
        match self.record_batch(owner, &staged, folder_id).await {
            Ok(files) => {
                tracing::info!("Stored {} file(s) for user {}", files.len(), owner);
                Ok(files)
            }
            Err(e) => {
                self.release_staged(&staged).await;
                Err(e)
            }
        }
    }

    /// Releases the content of staged files that will never be recorded.
    pub async fn release_staged(&self, staged: &[StagedFile]) {
        for file in staged {
            if let Err(e) = self.content.release(&file.content_key).await {
                tracing::warn!("Failed to release staged content {}: {}", file.content_key, e);
            }
        }
    }

    async fn record_batch(
        &self,
        owner: &str,
        staged: &[StagedFile],
        folder_id: Option<&str>,
    ) -> DriveResult<Vec<FileRecord>> {
        if staged.is_empty() {
            return Err(DriveError::InvalidInput {
                field: "files".to_string(),
                message: "Please upload files".to_string(),
            });
        }

        let total = staged
            .iter()
            .try_fold(0i64, |acc, f| acc.checked_add(f.size))
            .unwrap_or(i64::MAX);

        // Also rejects unknown owners
        let usage = quota::check_batch(&self.db, owner, total).await?;

        if let Some(folder) = folder_id {
            entities::find_folder(&self.db, owner, folder, State::Active)
                .await?
                .ok_or(DriveError::NotFound("Folder"))?;
        }

        let now = now_millis();
        let files: Vec<FileRecord> = staged
            .iter()
            .map(|s| FileRecord {
                id: super::new_id(),
                owner_id: owner.to_string(),
                folder_id: folder_id.map(str::to_string),
                name: s.name.clone(),
                content_key: s.content_key.clone(),
                size: s.size,
                mime_type: s.mime_type.clone(),
                is_trashed: false,
                trashed_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut tx = self.db.begin().await?;
        for file in &files {
            entities::insert_file(&mut *tx, file).await?;
        }
        quota::charge(&mut *tx, owner, total).await?;
        tx.commit().await?;

        tracing::debug!("Charged {} bytes to user {} ({} used before)", total, owner, usage.used);
        Ok(files)
    }
}
