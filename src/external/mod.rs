//! Collaborators the engine consumes but does not implement.
//!
//! The remote catalog, the settings store and the job scheduler are async;
//! storage and local file queries are cheap local lookups and stay synchronous
//! so toggles can recompute storage figures without awaiting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::{ContentTab, Course, CourseSyncSetting, CourseSyncSettingsWithFiles, FileSyncSetting, RemoteFile};
use crate::progress::CourseProgress;

/// Remote course catalog.
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// All eligible courses, or only `course_id` when scoped.
    async fn list_courses(&self, course_id: Option<i64>) -> Result<Vec<Course>>;

    async fn list_tabs(&self, course_id: i64) -> Result<Vec<ContentTab>>;

    /// Files visible to the current user (hidden and locked files excluded).
    async fn list_files(&self, course_id: i64) -> Result<Vec<RemoteFile>>;
}

/// Durable storage of sync settings.
#[async_trait]
pub trait SyncSettingsStore: Send + Sync {
    async fn find(&self, course_id: i64) -> Result<Option<CourseSyncSettingsWithFiles>>;

    /// Persist a course setting and replace its file rows atomically.
    async fn save(&self, settings: &CourseSyncSetting, files: &[FileSyncSetting]) -> Result<()>;
}

/// Device storage figures, in bytes.
pub trait StorageProbe: Send + Sync {
    fn total_space(&self) -> u64;
    fn free_space(&self) -> u64;
    fn app_size(&self) -> u64;
}

/// Index of files already moved to local storage.
pub trait LocalFileIndex: Send + Sync {
    fn is_fully_downloaded(&self, file_id: i64) -> bool;
    fn partial_bytes(&self, file_id: i64) -> u64;
}

/// Opaque handle of a submitted sync job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed(String),
}

/// Background scheduler that owns the actual byte transfer.
#[async_trait]
pub trait SyncScheduler: Send + Sync {
    async fn submit(&self, course_ids: &[i64]) -> Result<JobHandle>;

    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Per-course progress of a running job, when the scheduler reports it.
    async fn progress(&self, _handle: &JobHandle) -> Result<Vec<CourseProgress>> {
        Ok(Vec::new())
    }
}
