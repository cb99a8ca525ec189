//! Per-user storage accounting.
//!
//! `storage_used` counts every file that has not been purged, trashed or not.
//! The check in [`check_batch`] and the increment in [`charge`] are separate
//! statements, so two concurrent uploads can both pass the check and push
//! usage past the limit. Increments and decrements themselves are relative
//! (`storage_used = storage_used ± n`) and never lose each other.

use sqlx::{SqliteConnection, SqlitePool};

use super::{entities, DriveError, DriveResult};

/// Usage snapshot of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub used: i64,
    pub limit: i64,
}

impl Usage {
    pub fn allows(&self, additional: i64) -> bool {
        self.used.checked_add(additional).is_some_and(|total| total <= self.limit)
    }
}

pub async fn usage(pool: &SqlitePool, owner: &str) -> DriveResult<Usage> {
    let user = entities::find_user(pool, owner).await?.ok_or(DriveError::InvalidOwner)?;
    Ok(Usage { used: user.storage_used, limit: user.storage_limit })
}

/// Checks that `owner` can take `additional` more bytes.
pub async fn check_batch(pool: &SqlitePool, owner: &str, additional: i64) -> DriveResult<Usage> {
    let usage = usage(pool, owner).await?;
    if !usage.allows(additional) {
        return Err(DriveError::QuotaExceeded { requested: additional, used: usage.used, limit: usage.limit });
    }
    Ok(usage)
}

/// Adds `bytes` to the owner's usage.
pub async fn charge(conn: &mut SqliteConnection, owner: &str, bytes: i64) -> DriveResult<()> {
    let res = sqlx::query("UPDATE users SET storage_used = storage_used + ?1 WHERE id = ?2")
        .bind(bytes)
        .bind(owner)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(DriveError::InvalidOwner);
    }
    Ok(())
}

/// Subtracts exactly `bytes` from the owner's usage.
pub async fn refund(pool: &SqlitePool, owner: &str, bytes: i64) -> DriveResult<()> {
    sqlx::query("UPDATE users SET storage_used = storage_used - ?1 WHERE id = ?2")
        .bind(bytes)
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_allows() {
        let usage = Usage { used: 600, limit: 1000 };
        assert!(usage.allows(400));
        assert!(!usage.allows(401));
        assert!(usage.allows(0));

        let over = Usage { used: 1200, limit: 1000 };
        assert!(!over.allows(0));
        assert!(!Usage { used: 1, limit: i64::MAX }.allows(i64::MAX));
    }
}
