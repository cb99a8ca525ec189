use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::drive::PurgeReport;

/// Process-wide counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub uploads_accepted: Arc<AtomicU64>,
    pub uploads_rejected: Arc<AtomicU64>,
    pub files_uploaded: Arc<AtomicU64>,
    pub bytes_uploaded: Arc<AtomicU64>,
    pub items_trashed: Arc<AtomicU64>,
    pub items_restored: Arc<AtomicU64>,
    pub files_purged: Arc<AtomicU64>,
    pub folders_purged: Arc<AtomicU64>,
    pub bytes_purged: Arc<AtomicU64>,
    pub downloads: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            uploads_accepted: Arc::new(AtomicU64::new(0)),
            uploads_rejected: Arc::new(AtomicU64::new(0)),
            files_uploaded: Arc::new(AtomicU64::new(0)),
            bytes_uploaded: Arc::new(AtomicU64::new(0)),
            items_trashed: Arc::new(AtomicU64::new(0)),
            items_restored: Arc::new(AtomicU64::new(0)),
            files_purged: Arc::new(AtomicU64::new(0)),
            folders_purged: Arc::new(AtomicU64::new(0)),
            bytes_purged: Arc::new(AtomicU64::new(0)),
            downloads: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// An accepted upload batch of `files` files totalling `bytes`.
    pub fn record_upload(&self, files: u64, bytes: u64) {
        self.uploads_accepted.fetch_add(1, Ordering::Relaxed);
        self.files_uploaded.fetch_add(files, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_uploads_rejected(&self) {
        self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_trashed(&self) {
        self.items_trashed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restored(&self) {
        self.items_restored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_purge(&self, report: &PurgeReport) {
        self.files_purged.fetch_add(report.files, Ordering::Relaxed);
        self.folders_purged.fetch_add(report.folders, Ordering::Relaxed);
        self.bytes_purged.fetch_add(report.bytes.max(0) as u64, Ordering::Relaxed);
    }

    pub fn inc_downloads(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads_accepted: self.uploads_accepted.load(Ordering::Relaxed),
            uploads_rejected: self.uploads_rejected.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            items_trashed: self.items_trashed.load(Ordering::Relaxed),
            items_restored: self.items_restored.load(Ordering::Relaxed),
            files_purged: self.files_purged.load(Ordering::Relaxed),
            folders_purged: self.folders_purged.load(Ordering::Relaxed),
            bytes_purged: self.bytes_purged.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uploads_accepted: u64,
    pub uploads_rejected: u64,
    pub files_uploaded: u64,
    pub bytes_uploaded: u64,
    pub items_trashed: u64,
    pub items_restored: u64,
    pub files_purged: u64,
    pub folders_purged: u64,
    pub bytes_purged: u64,
    pub downloads: u64,
    pub uptime_seconds: u64,
}
