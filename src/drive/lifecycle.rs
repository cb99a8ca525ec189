//! Trash, restore and permanent deletion of single items, plus the folder and
//! listing operations around them.

use super::{
    entities, entities::State, new_id, now_millis, validate_name, Drive, DriveError, DriveResult, FileRecord, Folder,
    Item, PurgeReport,
};

/// A file or folder record after a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(FileRecord),
    Folder(Folder),
}

/// Folders and files of one listing, newest first.
#[derive(Debug, Clone, Default)]
pub struct Contents {
    pub folders: Vec<Folder>,
    pub files: Vec<FileRecord>,
}

impl Drive {
    /// ACTIVE -> TRASHED. Folders take their whole subtree with them.
    pub async fn move_to_trash(&self, owner: &str, item: &Item) -> DriveResult<Entry> {
        match item {
            Item::File(id) => {
                let now = now_millis();
                let updated = entities::set_file_trashed(&self.db, owner, id, State::Active, Some(now), now).await?;
                if updated == 0 {
                    return Err(DriveError::NotFound("File"));
                }
                tracing::info!("Moved file {} to trash", id);
                self.file_entry(owner, id).await
            }
            Item::Folder(id) => {
                self.cascade_trash(owner, id).await?;
                self.folder_entry(owner, id).await
            }
        }
    }

    /// TRASHED -> ACTIVE. Folders restore their whole subtree.
    pub async fn restore(&self, owner: &str, item: &Item) -> DriveResult<Entry> {
        match item {
            Item::File(id) => {
                let updated =
                    entities::set_file_trashed(&self.db, owner, id, State::Trashed, None, now_millis()).await?;
                if updated == 0 {
                    return Err(DriveError::NotFound("File"));
                }
                tracing::info!("Restored file {}", id);
                self.file_entry(owner, id).await
            }
            Item::Folder(id) => {
                self.cascade_restore(owner, id).await?;
                self.folder_entry(owner, id).await
            }
        }
    }

    /// Removes an item in any state for good and refunds the bytes of every
    /// file it contained.
    pub async fn delete_permanently(&self, owner: &str, item: &Item) -> DriveResult<PurgeReport> {
        match item {
            Item::File(id) => {
                let file = self.find_file(owner, id).await?;
                let report = self.purge_file(&file).await?;
                tracing::info!("Purged file {} ({} bytes)", id, report.bytes);
                Ok(report)
            }
            Item::Folder(id) => self.cascade_delete(owner, id).await,
        }
    }

    pub async fn create_folder(&self, owner: &str, name: &str, parent: Option<&str>) -> DriveResult<Folder> {
        let name = validate_name(name)?;
        if entities::find_user(&self.db, owner).await?.is_none() {
            return Err(DriveError::InvalidOwner);
        }
        if let Some(parent) = parent {
            entities::find_folder(&self.db, owner, parent, State::Active)
                .await?
                .ok_or(DriveError::NotFound("Folder"))?;
        }

        let folder = Folder {
            id: new_id(),
            owner_id: owner.to_string(),
            parent_id: parent.map(str::to_string),
            name,
            is_trashed: false,
            trashed_at: None,
            created_at: now_millis(),
        };
        entities::insert_folder(&self.db, &folder).await?;
        tracing::debug!("Created folder {} for user {}", folder.id, owner);
        Ok(folder)
    }

    /// Renames a file or folder in any state. File renames touch `updated_at`.
    pub async fn rename(&self, owner: &str, item: &Item, name: &str) -> DriveResult<Entry> {
        let name = validate_name(name)?;
        match item {
            Item::File(id) => {
                if entities::rename_file(&self.db, owner, id, &name, now_millis()).await? == 0 {
                    return Err(DriveError::NotFound("File"));
                }
                self.file_entry(owner, id).await
            }
            Item::Folder(id) => {
                if entities::rename_folder(&self.db, owner, id, &name).await? == 0 {
                    return Err(DriveError::NotFound("Folder"));
                }
                self.folder_entry(owner, id).await
            }
        }
    }

    /// Non-trashed folders and files directly inside `folder` (root when `None`).
    pub async fn list_contents(&self, owner: &str, folder: Option<&str>) -> DriveResult<Contents> {
        let folders = entities::list_folders_in(&self.db, owner, folder, State::Active).await?;
        let files = entities::list_files_in(&self.db, owner, folder, State::Active).await?;
        Ok(Contents { folders, files })
    }

    pub async fn list_folders(&self, owner: &str) -> DriveResult<Vec<Folder>> {
        entities::list_folders(&self.db, owner, State::Active).await
    }

    /// Everything of `owner` that is currently in the trash.
    pub async fn list_trash(&self, owner: &str) -> DriveResult<Contents> {
        let folders = entities::list_folders(&self.db, owner, State::Trashed).await?;
        let files = entities::list_files(&self.db, owner, State::Trashed).await?;
        Ok(Contents { folders, files })
    }

    pub async fn find_file(&self, owner: &str, id: &str) -> DriveResult<FileRecord> {
        entities::find_file(&self.db, owner, id, State::Any)
            .await?
            .ok_or(DriveError::NotFound("File"))
    }

    pub async fn find_folder(&self, owner: &str, id: &str) -> DriveResult<Folder> {
        entities::find_folder(&self.db, owner, id, State::Any)
            .await?
            .ok_or(DriveError::NotFound("Folder"))
    }

    async fn file_entry(&self, owner: &str, id: &str) -> DriveResult<Entry> {
        self.find_file(owner, id).await.map(Entry::File)
    }

    async fn folder_entry(&self, owner: &str, id: &str) -> DriveResult<Entry> {
        self.find_folder(owner, id).await.map(Entry::Folder)
    }
}
