use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

/// Opens (and creates if missing) the SQLite database behind `url`.
///
/// Connection-scoped pragmas are applied on every new connection, since
/// `foreign_keys` does not survive across pooled connections.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        tracing::info!("Creating SQLite database at {}", url);
        Sqlite::create_database(url).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys=ON;").execute(&mut *conn).await?;
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                let _ = sqlx::query("PRAGMA temp_store=MEMORY;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    // users table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            storage_used INTEGER NOT NULL DEFAULT 0,
            storage_limit INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // folders table; parent_id NULL = root. No ON DELETE CASCADE: subtrees are
    // removed explicitly, children before parent.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS folders (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            parent_id TEXT NULL,
            name TEXT NOT NULL,
            is_trashed INTEGER NOT NULL DEFAULT 0,
            trashed_at INTEGER NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES users(id),
            FOREIGN KEY(parent_id) REFERENCES folders(id)
        )"#,
    )
    .execute(pool)
    .await?;

    // files table; content_key names the stored bytes in the content store
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            folder_id TEXT NULL,
            name TEXT NOT NULL,
            content_key TEXT NOT NULL,
            size INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            is_trashed INTEGER NOT NULL DEFAULT 0,
            trashed_at INTEGER NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES users(id),
            FOREIGN KEY(folder_id) REFERENCES folders(id)
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_folders_owner_parent", "CREATE INDEX IF NOT EXISTS idx_folders_owner_parent ON folders(owner_id, parent_id)"),
        ("idx_folders_owner_trashed", "CREATE INDEX IF NOT EXISTS idx_folders_owner_trashed ON folders(owner_id, is_trashed)"),
        ("idx_files_owner_folder", "CREATE INDEX IF NOT EXISTS idx_files_owner_folder ON files(owner_id, folder_id)"),
        ("idx_files_owner_trashed", "CREATE INDEX IF NOT EXISTS idx_files_owner_trashed ON files(owner_id, is_trashed)"),
        ("idx_files_owner_updated", "CREATE INDEX IF NOT EXISTS idx_files_owner_updated ON files(owner_id, updated_at DESC)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}
