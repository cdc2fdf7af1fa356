use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::record::UploadRecord;
use crate::status::UploadStatus;

/// Answers whether a record is the one a worker is transferring right now.
pub trait UploadActivity: Send + Sync {
    fn is_uploading_now(&self, record: &UploadRecord) -> bool;
}

/// Frozen view of the fields an upload list sorts and renders by.
///
/// Workers keep mutating the live record while a list is on screen, so the
/// list takes one of these per row before sorting and works from it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub upload_id: i64,
    pub status: UploadStatus,
    pub uploading_now: bool,
    pub end_timestamp: i64,
}

impl DisplaySnapshot {
    /// Active uploads first, then by status group, newest end time, highest id.
    pub fn display_order(&self, other: &Self) -> Ordering {
        other
            .uploading_now
            .cmp(&self.uploading_now)
            .then_with(|| self.status.display_rank().cmp(&other.status.display_rank()))
            .then_with(|| other.end_timestamp.cmp(&self.end_timestamp))
            .then_with(|| other.upload_id.cmp(&self.upload_id))
    }
}

/// Snapshots a record shared with a worker, holding its read lock for the copy.
pub fn snapshot_shared(
    record: &RwLock<UploadRecord>,
    activity: Option<&dyn UploadActivity>,
) -> DisplaySnapshot {
    let guard = record.read().unwrap_or_else(PoisonError::into_inner);
    guard.snapshot(activity)
}

/// Returns `(snapshot, index into records)` pairs in display order.
pub fn sort_for_display(
    records: &[UploadRecord],
    activity: Option<&dyn UploadActivity>,
) -> Vec<(DisplaySnapshot, usize)> {
    let mut rows: Vec<(DisplaySnapshot, usize)> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (record.snapshot(activity), index))
        .collect();
    rows.sort_by(|(left, _), (right, _)| left.display_order(right));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ActivityKey {
    account_name: String,
    remote_path: String,
}

impl ActivityKey {
    fn of(record: &UploadRecord) -> Self {
        Self {
            account_name: record.account_name().to_string(),
            remote_path: record.remote_path().to_string(),
        }
    }
}

/// Tracks running uploads by account and remote path.
#[derive(Debug, Default)]
pub struct InMemoryUploadActivity {
    active: RwLock<HashSet<ActivityKey>>,
}

impl InMemoryUploadActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, record: &UploadRecord) {
        debug!(
            account = %record.account_name(),
            remote_path = %record.remote_path(),
            "upload started"
        );
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ActivityKey::of(record));
    }

    pub fn finish(&self, record: &UploadRecord) -> bool {
        let removed = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ActivityKey::of(record));
        if removed {
            debug!(
                account = %record.account_name(),
                remote_path = %record.remote_path(),
                "upload finished"
            );
        }
        removed
    }

    pub fn active_count(&self) -> usize {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl UploadActivity for InMemoryUploadActivity {
    fn is_uploading_now(&self, record: &UploadRecord) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&ActivityKey::of(record))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn record(id: i64, name: &str) -> UploadRecord {
        let mut record = UploadRecord::new(
            format!("/sdcard/{name}"),
            format!("/Photos/{name}"),
            "user@server",
        )
        .expect("valid record");
        record.set_upload_id(id);
        record
    }

    #[test]
    fn snapshot_reads_live_fields_and_probe() {
        let mut live = record(7, "a.jpg");
        live.set_upload_end_timestamp(1_000);

        let activity = InMemoryUploadActivity::new();
        assert!(!live.snapshot(Some(&activity)).uploading_now);

        activity.begin(&live);
        let snapshot = live.snapshot(Some(&activity));
        assert_eq!(
            snapshot,
            DisplaySnapshot {
                upload_id: 7,
                status: UploadStatus::InProgress,
                uploading_now: true,
                end_timestamp: 1_000,
            }
        );

        assert!(!live.snapshot(None).uploading_now);
    }

    #[test]
    fn snapshot_does_not_follow_later_mutation() {
        let mut live = record(1, "a.jpg");
        let before = live.snapshot(None);

        live.transition(UploadStatus::Succeeded);
        live.set_upload_end_timestamp(99);

        assert_eq!(before.status, UploadStatus::InProgress);
        assert_eq!(before.end_timestamp, 0);
        assert_eq!(live.snapshot(None).status, UploadStatus::Succeeded);
    }

    #[test]
    fn finish_reports_whether_upload_was_active() {
        let activity = InMemoryUploadActivity::new();
        let live = record(1, "a.jpg");

        assert!(!activity.finish(&live));
        activity.begin(&live);
        assert_eq!(activity.active_count(), 1);
        assert!(activity.finish(&live));
        assert_eq!(activity.active_count(), 0);
        assert!(!activity.is_uploading_now(&live));
    }

    #[test]
    fn sort_puts_active_uploads_first_then_status_then_recency() {
        let mut done_old = record(1, "done-old.jpg");
        done_old.transition(UploadStatus::Succeeded);
        done_old.set_upload_end_timestamp(100);

        let mut done_new = record(2, "done-new.jpg");
        done_new.transition(UploadStatus::Succeeded);
        done_new.set_upload_end_timestamp(200);

        let mut failed = record(3, "failed.jpg");
        failed.transition(UploadStatus::Failed);

        let queued = record(4, "queued.jpg");
        let running = record(5, "running.jpg");

        let activity = InMemoryUploadActivity::new();
        activity.begin(&running);

        let records = vec![done_old, done_new, failed, queued, running];
        let ids: Vec<i64> = sort_for_display(&records, Some(&activity))
            .into_iter()
            .map(|(snapshot, index)| {
                assert_eq!(records[index].upload_id(), snapshot.upload_id);
                snapshot.upload_id
            })
            .collect();

        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn shared_snapshot_is_taken_under_read_lock() {
        let shared = Arc::new(RwLock::new(record(10, "shared.jpg")));

        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut guard = shared.write().expect("write lock");
                guard.transition(UploadStatus::Failed);
                guard.set_upload_end_timestamp(42);
            })
        };
        writer.join().expect("writer thread");

        let snapshot = snapshot_shared(&shared, None);
        assert_eq!(snapshot.status, UploadStatus::Failed);
        assert_eq!(snapshot.end_timestamp, 42);
    }
}
