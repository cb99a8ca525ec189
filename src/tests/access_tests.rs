#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;

    use crate::drive::{DriveError, Item};
    use crate::tests::harness::{create_user, setup, storage_used, upload, upload_sized};

    async fn tick() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn test_record_access_only_touches_updated_at() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let file = upload_sized(&t.drive, &user, "seen.txt", 20, None).await;
        tick().await;

        let touched = t.drive.record_access(&user, &file.id).await.unwrap();
        assert!(touched.updated_at > file.updated_at);
        assert_eq!(touched.created_at, file.created_at);
        assert_eq!(touched.name, file.name);
        assert_eq!(touched.size, file.size);
        assert_eq!(touched.folder_id, file.folder_id);
        assert_eq!(touched.is_trashed, file.is_trashed);
        assert_eq!(storage_used(&t.pool, &user).await, 20);
    }

    #[tokio::test]
    async fn test_recent_orders_by_last_touch() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let mut ids = Vec::new();
        for name in ["one.txt", "two.txt", "three.txt"] {
            ids.push(upload_sized(&t.drive, &user, name, 1, None).await.id);
            tick().await;
        }

        let recent = t.drive.list_recent(&user, 10).await.unwrap();
        let names: Vec<_> = recent.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["three.txt", "two.txt", "one.txt"]);

        t.drive.record_access(&user, &ids[0]).await.unwrap();
        let recent = t.drive.list_recent(&user, 2).await.unwrap();
        let names: Vec<_> = recent.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["one.txt", "three.txt"]);
    }

    #[tokio::test]
    async fn test_recent_excludes_trashed_and_other_owners() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let other = create_user(&t.pool, 10_000).await;
        let kept = upload_sized(&t.drive, &user, "kept.txt", 1, None).await;
        let binned = upload_sized(&t.drive, &user, "binned.txt", 1, None).await;
        upload_sized(&t.drive, &other, "theirs.txt", 1, None).await;
        tick().await;

        // Trashing is the latest touch, the file must still not appear
        t.drive.move_to_trash(&user, &Item::File(binned.id.clone())).await.unwrap();

        let recent = t.drive.list_recent(&user, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_recent_with_non_positive_limit_is_empty() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        upload_sized(&t.drive, &user, "a.txt", 1, None).await;

        assert!(t.drive.list_recent(&user, 0).await.unwrap().is_empty());
        assert!(t.drive.list_recent(&user, -5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_content_streams_bytes_and_counts_access() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let files = upload(&t.drive, &user, &[("hello.txt", &b"hello, wolkenlager"[..])], None).await.unwrap();
        let file = &files[0];
        tick().await;

        let (record, mut reader) = t.drive.open_content(&user, &file.id).await.unwrap();
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello, wolkenlager");
        assert!(record.updated_at > file.updated_at);
    }

    #[tokio::test]
    async fn test_open_content_with_missing_blob_is_not_found() {
        let t = setup().await;
        let user = create_user(&t.pool, 10_000).await;
        let file = upload_sized(&t.drive, &user, "gone.txt", 3, None).await;
        std::fs::remove_file(t.uploads.join(&file.content_key)).unwrap();

        let res = t.drive.open_content(&user, &file.id).await;
        assert!(matches!(res, Err(DriveError::NotFound("File content"))));
        // A failed download is not an access
        assert_eq!(t.drive.find_file(&user, &file.id).await.unwrap().updated_at, file.updated_at);
    }
}
