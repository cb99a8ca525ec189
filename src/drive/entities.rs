//! Records and queries for users, folders and files.
//!
//! Lookups take the owner id and a [`State`] filter. Mutations that the
//! lifecycle depends on report the number of affected rows so callers can map
//! "no row matched" onto `NotFound`.

use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::DriveResult;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub storage_used: i64,
    pub storage_limit: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Folder {
    pub id: String,
    pub owner_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub is_trashed: bool,
    pub trashed_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    pub folder_id: Option<String>,
    pub name: String,
    pub content_key: String,
    pub size: i64,
    pub mime_type: String,
    pub is_trashed: bool,
    pub trashed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Which trash state a lookup is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Any,
    Active,
    Trashed,
}

impl State {
    fn clause(self) -> &'static str {
        match self {
            State::Any => "",
            State::Active => " AND is_trashed = 0",
            State::Trashed => " AND is_trashed = 1",
        }
    }
}

const FOLDER_COLUMNS: &str = "id, owner_id, parent_id, name, is_trashed, trashed_at, created_at";
const FILE_COLUMNS: &str =
    "id, owner_id, folder_id, name, content_key, size, mime_type, is_trashed, trashed_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// users

pub async fn insert_user(pool: &SqlitePool, user: &User) -> DriveResult<()> {
    sqlx::query(
        r#"INSERT INTO users (id, name, email, password_hash, storage_used, storage_limit, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.storage_used)
    .bind(user.storage_limit)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_user(pool: &SqlitePool, id: &str) -> DriveResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> DriveResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

// ---------------------------------------------------------------------------
// folders

pub async fn insert_folder(pool: &SqlitePool, folder: &Folder) -> DriveResult<()> {
    sqlx::query(
        r#"INSERT INTO folders (id, owner_id, parent_id, name, is_trashed, trashed_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
    )
    .bind(&folder.id)
    .bind(&folder.owner_id)
    .bind(&folder.parent_id)
    .bind(&folder.name)
    .bind(folder.is_trashed)
    .bind(folder.trashed_at)
    .bind(folder.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_folder(pool: &SqlitePool, owner: &str, id: &str, state: State) -> DriveResult<Option<Folder>> {
    let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?1 AND owner_id = ?2{}", state.clause());
    let folder = sqlx::query_as::<_, Folder>(&sql).bind(id).bind(owner).fetch_optional(pool).await?;
    Ok(folder)
}

/// Direct subfolders of `parent` regardless of their trash state.
pub async fn child_folder_ids(pool: &SqlitePool, owner: &str, parent: &str) -> DriveResult<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>("SELECT id FROM folders WHERE owner_id = ?1 AND parent_id = ?2")
        .bind(owner)
        .bind(parent)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Folders directly inside `parent` (`None` = root), newest first.
pub async fn list_folders_in(
    pool: &SqlitePool,
    owner: &str,
    parent: Option<&str>,
    state: State,
) -> DriveResult<Vec<Folder>> {
    let sql = format!(
        "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = ?1 AND parent_id IS ?2{} ORDER BY created_at DESC, rowid DESC",
        state.clause()
    );
    let folders = sqlx::query_as::<_, Folder>(&sql).bind(owner).bind(parent).fetch_all(pool).await?;
    Ok(folders)
}

/// Every folder of `owner` in `state`, newest first.
pub async fn list_folders(pool: &SqlitePool, owner: &str, state: State) -> DriveResult<Vec<Folder>> {
    let sql = format!(
        "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = ?1{} ORDER BY created_at DESC, rowid DESC",
        state.clause()
    );
    let folders = sqlx::query_as::<_, Folder>(&sql).bind(owner).fetch_all(pool).await?;
    Ok(folders)
}

/// Writes the trash flag of one folder if it currently matches `from`.
pub async fn set_folder_trashed(
    pool: &SqlitePool,
    owner: &str,
    id: &str,
    from: State,
    trashed_at: Option<i64>,
) -> DriveResult<u64> {
    let sql = format!(
        "UPDATE folders SET is_trashed = ?1, trashed_at = ?2 WHERE id = ?3 AND owner_id = ?4{}",
        from.clause()
    );
    let res = sqlx::query(&sql)
        .bind(trashed_at.is_some())
        .bind(trashed_at)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn rename_folder(pool: &SqlitePool, owner: &str, id: &str, name: &str) -> DriveResult<u64> {
    let res = sqlx::query("UPDATE folders SET name = ?1 WHERE id = ?2 AND owner_id = ?3")
        .bind(name)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_folder_record(pool: &SqlitePool, owner: &str, id: &str) -> DriveResult<u64> {
    let res = sqlx::query("DELETE FROM folders WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// ---------------------------------------------------------------------------
// files

pub async fn insert_file(conn: &mut SqliteConnection, file: &FileRecord) -> DriveResult<()> {
    sqlx::query(
        r#"INSERT INTO files (id, owner_id, folder_id, name, content_key, size, mime_type,
                              is_trashed, trashed_at, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
    )
    .bind(&file.id)
    .bind(&file.owner_id)
    .bind(&file.folder_id)
    .bind(&file.name)
    .bind(&file.content_key)
    .bind(file.size)
    .bind(&file.mime_type)
    .bind(file.is_trashed)
    .bind(file.trashed_at)
    .bind(file.created_at)
    .bind(file.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_file(pool: &SqlitePool, owner: &str, id: &str, state: State) -> DriveResult<Option<FileRecord>> {
    let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1 AND owner_id = ?2{}", state.clause());
    let file = sqlx::query_as::<_, FileRecord>(&sql).bind(id).bind(owner).fetch_optional(pool).await?;
    Ok(file)
}

/// Files whose folder is exactly `folder`, regardless of their trash state.
pub async fn files_in_folder(pool: &SqlitePool, owner: &str, folder: &str) -> DriveResult<Vec<FileRecord>> {
    let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 AND folder_id = ?2");
    let files = sqlx::query_as::<_, FileRecord>(&sql).bind(owner).bind(folder).fetch_all(pool).await?;
    Ok(files)
}

/// Files directly inside `folder` (`None` = root), newest first.
pub async fn list_files_in(
    pool: &SqlitePool,
    owner: &str,
    folder: Option<&str>,
    state: State,
) -> DriveResult<Vec<FileRecord>> {
    let sql = format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 AND folder_id IS ?2{} ORDER BY created_at DESC, rowid DESC",
        state.clause()
    );
    let files = sqlx::query_as::<_, FileRecord>(&sql).bind(owner).bind(folder).fetch_all(pool).await?;
    Ok(files)
}

/// Every file of `owner` in `state`, newest first.
pub async fn list_files(pool: &SqlitePool, owner: &str, state: State) -> DriveResult<Vec<FileRecord>> {
    let sql = format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1{} ORDER BY created_at DESC, rowid DESC",
        state.clause()
    );
    let files = sqlx::query_as::<_, FileRecord>(&sql).bind(owner).fetch_all(pool).await?;
    Ok(files)
}

/// Writes the trash flag of one file if it currently matches `from`.
/// Touches `updated_at` like every other file mutation.
pub async fn set_file_trashed(
    pool: &SqlitePool,
    owner: &str,
    id: &str,
    from: State,
    trashed_at: Option<i64>,
    now: i64,
) -> DriveResult<u64> {
    let sql = format!(
        "UPDATE files SET is_trashed = ?1, trashed_at = ?2, updated_at = ?3 WHERE id = ?4 AND owner_id = ?5{}",
        from.clause()
    );
    let res = sqlx::query(&sql)
        .bind(trashed_at.is_some())
        .bind(trashed_at)
        .bind(now)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Writes the trash flag of every file directly inside `folder`.
pub async fn set_files_trashed_in_folder(
    pool: &SqlitePool,
    owner: &str,
    folder: &str,
    trashed_at: Option<i64>,
    now: i64,
) -> DriveResult<u64> {
    let res = sqlx::query(
        "UPDATE files SET is_trashed = ?1, trashed_at = ?2, updated_at = ?3 WHERE owner_id = ?4 AND folder_id = ?5",
    )
    .bind(trashed_at.is_some())
    .bind(trashed_at)
    .bind(now)
    .bind(owner)
    .bind(folder)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn rename_file(pool: &SqlitePool, owner: &str, id: &str, name: &str, now: i64) -> DriveResult<u64> {
    let res = sqlx::query("UPDATE files SET name = ?1, updated_at = ?2 WHERE id = ?3 AND owner_id = ?4")
        .bind(name)
        .bind(now)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn touch_file(pool: &SqlitePool, owner: &str, id: &str, now: i64) -> DriveResult<u64> {
    let res = sqlx::query("UPDATE files SET updated_at = ?1 WHERE id = ?2 AND owner_id = ?3")
        .bind(now)
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_file_record(pool: &SqlitePool, owner: &str, id: &str) -> DriveResult<u64> {
    let res = sqlx::query("DELETE FROM files WHERE id = ?1 AND owner_id = ?2")
        .bind(id)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Non-trashed files of `owner`, most recently touched first.
pub async fn recent_files(pool: &SqlitePool, owner: &str, limit: i64) -> DriveResult<Vec<FileRecord>> {
    let sql = format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE owner_id = ?1 AND is_trashed = 0 \
         ORDER BY updated_at DESC, rowid DESC LIMIT ?2"
    );
    let files = sqlx::query_as::<_, FileRecord>(&sql).bind(owner).bind(limit).fetch_all(pool).await?;
    Ok(files)
}
