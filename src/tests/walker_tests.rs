#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::content::{ContentReader, ContentStore, ContentWriter, DiskContentStore};
    use crate::drive::{CascadeReport, DriveError, FileRecord, Folder, Item};
    use crate::tests::harness::{create_user, folder, setup, setup_with_store, storage_used, upload_sized, TestDrive};

    /// Disk store whose `release` fails for selected keys.
    struct FailingStore {
        inner: DiskContentStore,
        fail_release: Mutex<HashSet<String>>,
    }

    impl FailingStore {
        fn fail_on(&self, key: &str) {
            self.fail_release.lock().unwrap().insert(key.to_string());
        }
    }

    #[async_trait]
    impl ContentStore for FailingStore {
        async fn create(&self, key: &str) -> io::Result<ContentWriter> {
            self.inner.create(key).await
        }

        async fn open(&self, key: &str) -> io::Result<ContentReader> {
            self.inner.open(key).await
        }

        async fn release(&self, key: &str) -> io::Result<bool> {
            if self.fail_release.lock().unwrap().contains(key) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "release refused"));
            }
            self.inner.release(key).await
        }
    }

    /// A contains file X (100 bytes) and folder B; B contains file Y (50 bytes).
    struct Tree {
        user: String,
        a: Folder,
        b: Folder,
        x: FileRecord,
        y: FileRecord,
    }

    async fn build_tree(t: &TestDrive) -> Tree {
        let user = create_user(&t.pool, 10_000).await;
        let a = folder(&t.drive, &user, "A", None).await;
        let b = folder(&t.drive, &user, "B", Some(&a.id)).await;
        let x = upload_sized(&t.drive, &user, "x.bin", 100, Some(&a.id)).await;
        let y = upload_sized(&t.drive, &user, "y.bin", 50, Some(&b.id)).await;
        Tree { user, a, b, x, y }
    }

    #[tokio::test]
    async fn test_cascade_scenario_trash_then_delete() {
        let t = setup().await;
        let tree = build_tree(&t).await;
        assert_eq!(storage_used(&t.pool, &tree.user).await, 150);

        let report = t.drive.cascade_trash(&tree.user, &tree.a.id).await.unwrap();
        assert_eq!(report, CascadeReport { folders: 2, files: 2 });
        for file in [&tree.x, &tree.y] {
            assert!(t.drive.find_file(&tree.user, &file.id).await.unwrap().is_trashed);
        }
        for dir in [&tree.a, &tree.b] {
            let found = t.drive.find_folder(&tree.user, &dir.id).await.unwrap();
            assert!(found.is_trashed);
            assert!(found.trashed_at.is_some());
        }
        assert_eq!(storage_used(&t.pool, &tree.user).await, 150);

        let purge = t.drive.cascade_delete(&tree.user, &tree.a.id).await.unwrap();
        assert_eq!(purge.files, 2);
        assert_eq!(purge.folders, 2);
        assert_eq!(purge.bytes, 150);
        assert_eq!(storage_used(&t.pool, &tree.user).await, 0);

        for file in [&tree.x, &tree.y] {
            assert!(matches!(t.drive.find_file(&tree.user, &file.id).await, Err(DriveError::NotFound(_))));
        }
        for dir in [&tree.a, &tree.b] {
            assert!(matches!(t.drive.find_folder(&tree.user, &dir.id).await, Err(DriveError::NotFound(_))));
        }
        assert_eq!(t.stored_blobs(), 0);
    }

    #[tokio::test]
    async fn test_cascade_restore_restores_subtree() {
        let t = setup().await;
        let tree = build_tree(&t).await;

        t.drive.move_to_trash(&tree.user, &Item::Folder(tree.a.id.clone())).await.unwrap();
        let report = t.drive.cascade_restore(&tree.user, &tree.a.id).await.unwrap();
        assert_eq!(report, CascadeReport { folders: 2, files: 2 });

        for file in [&tree.x, &tree.y] {
            let found = t.drive.find_file(&tree.user, &file.id).await.unwrap();
            assert!(!found.is_trashed);
            assert_eq!(found.trashed_at, None);
            assert_eq!(found.folder_id, file.folder_id);
        }
        for dir in [&tree.a, &tree.b] {
            let found = t.drive.find_folder(&tree.user, &dir.id).await.unwrap();
            assert!(!found.is_trashed);
            assert_eq!(found.parent_id, dir.parent_id);
        }
        assert_eq!(storage_used(&t.pool, &tree.user).await, 150);
    }

    #[tokio::test]
    async fn test_cascade_trash_reaches_deep_descendants() {
        let t = setup().await;
        let user = create_user(&t.pool, 100_000).await;
        let root = folder(&t.drive, &user, "level-0", None).await;
        let mut parent = root.clone();
        let mut files = Vec::new();
        for depth in 1..=6 {
            let child = folder(&t.drive, &user, &format!("level-{}", depth), Some(&parent.id)).await;
            files.push(upload_sized(&t.drive, &user, &format!("f{}.txt", depth), depth, Some(&child.id)).await);
            parent = child;
        }
        let outside = upload_sized(&t.drive, &user, "outside.txt", 1, None).await;

        let report = t.drive.cascade_trash(&user, &root.id).await.unwrap();
        assert_eq!(report, CascadeReport { folders: 7, files: 6 });
        for file in &files {
            assert!(t.drive.find_file(&user, &file.id).await.unwrap().is_trashed);
        }
        assert!(!t.drive.find_file(&user, &outside.id).await.unwrap().is_trashed);
        assert_eq!(t.drive.list_trash(&user).await.unwrap().folders.len(), 7);
    }

    #[tokio::test]
    async fn test_delete_untrashed_folder_purges_subtree() {
        let t = setup().await;
        let tree = build_tree(&t).await;

        let purge = t.drive.delete_permanently(&tree.user, &Item::Folder(tree.b.id.clone())).await.unwrap();
        assert_eq!((purge.folders, purge.files, purge.bytes), (1, 1, 50));
        assert_eq!(storage_used(&t.pool, &tree.user).await, 100);

        // The parent and its own file are untouched
        assert!(!t.drive.find_folder(&tree.user, &tree.a.id).await.unwrap().is_trashed);
        assert!(!t.drive.find_file(&tree.user, &tree.x.id).await.unwrap().is_trashed);
    }

    #[tokio::test]
    async fn test_failed_release_leaves_partially_purged_tree() {
        let mut failing = None;
        let t = setup_with_store(|disk| {
            let store = Arc::new(FailingStore { inner: disk, fail_release: Mutex::new(HashSet::new()) });
            failing = Some(store.clone());
            store as Arc<dyn ContentStore>
        })
        .await;
        let failing = failing.unwrap();

        let tree = build_tree(&t).await;
        failing.fail_on(&tree.y.content_key);

        let res = t.drive.cascade_delete(&tree.user, &tree.a.id).await;
        assert!(matches!(res, Err(DriveError::Content(_))));

        // X went first and is gone for good, including its quota
        assert!(matches!(t.drive.find_file(&tree.user, &tree.x.id).await, Err(DriveError::NotFound(_))));
        assert_eq!(storage_used(&t.pool, &tree.user).await, 50);

        // Y, B and A are still there
        assert!(t.drive.find_file(&tree.user, &tree.y.id).await.is_ok());
        assert!(t.drive.find_folder(&tree.user, &tree.b.id).await.is_ok());
        assert!(t.drive.find_folder(&tree.user, &tree.a.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_refund_keeps_charge_of_removed_file() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let keep = upload_sized(&t.drive, &user, "keep.bin", 40, None).await;
        let file = upload_sized(&t.drive, &user, "file.bin", 60, None).await;

        sqlx::query(
            "CREATE TRIGGER refuse_refund BEFORE UPDATE OF storage_used ON users
             WHEN NEW.storage_used < OLD.storage_used
             BEGIN SELECT RAISE(ABORT, 'refund refused'); END",
        )
        .execute(&t.pool)
        .await
        .unwrap();

        let res = t.drive.delete_permanently(&user, &Item::File(file.id.clone())).await;
        assert!(matches!(res, Err(DriveError::Database(_))));

        // Content and record are gone, the charge is not
        assert!(matches!(t.drive.find_file(&user, &file.id).await, Err(DriveError::NotFound(_))));
        assert!(!t.has_blob(&file.content_key));
        assert!(t.has_blob(&keep.content_key));
        assert_eq!(storage_used(&t.pool, &user).await, 100);
    }
}
