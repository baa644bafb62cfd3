//! Background polling of a submitted sync job and the follow-up refresh.

use tokio_util::sync::CancellationToken;

use super::{fetch, EngineEvent, LoadRequest, SyncOrchestrator, SyncPhase};
use crate::errors::{Result, SyncError};
use crate::external::{JobHandle, JobStatus};
use crate::models::Course;
use crate::progress::AggregateProgress;

impl SyncOrchestrator {
    /// Poll until the job settles, then reconcile the tree with the outcome.
    pub(super) async fn run_job(
        self,
        handle: JobHandle,
        course_ids: Vec<i64>,
        token: CancellationToken,
    ) {
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(SyncError::Cancelled),
            outcome = self.watch_job(&handle) => outcome,
        };

        match outcome {
            Ok(()) => self.finish_completed(course_ids, &token).await,
            Err(SyncError::Cancelled) => {
                tracing::info!("Stopped polling sync job {}", handle.0);
            }
            Err(e) => self.finish_failed(e).await,
        }
    }

    async fn watch_job(&self, handle: &JobHandle) -> Result<()> {
        let config = &self.inner.config;
        let scheduler = &self.inner.collaborators.scheduler;
        let mut consecutive_errors = 0u32;

        for attempt in 1..=config.max_poll_attempts {
            tokio::time::sleep(config.poll_interval).await;

            match scheduler.poll_status(handle).await {
                Ok(JobStatus::Completed) => {
                    self.record_progress(handle).await;
                    return Ok(());
                }
                Ok(JobStatus::InProgress) => {
                    consecutive_errors = 0;
                    self.record_progress(handle).await;
                }
                Ok(JobStatus::Failed(reason)) => {
                    return Err(SyncError::ProgressPoll(format!(
                        "Sync job failed: {}",
                        reason
                    )));
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        "Poll {} failed ({}/{}): {}",
                        attempt,
                        consecutive_errors,
                        config.max_poll_errors,
                        e
                    );
                    if consecutive_errors >= config.max_poll_errors {
                        return Err(SyncError::ProgressPoll(format!(
                            "Could not determine sync status: {}",
                            e.message()
                        )));
                    }
                }
            }
        }

        Err(SyncError::ProgressPoll(format!(
            "Sync job still running after {} polls",
            config.max_poll_attempts
        )))
    }

    async fn record_progress(&self, handle: &JobHandle) {
        match self.inner.collaborators.scheduler.progress(handle).await {
            Ok(courses) if courses.is_empty() => {}
            Ok(courses) => {
                let aggregate =
                    AggregateProgress::from_courses(&courses, self.inner.accountant.tab_unit_size());
                tracing::debug!(
                    "Sync progress {}% ({} of {} bytes)",
                    aggregate.percentage(),
                    aggregate.downloaded_bytes,
                    aggregate.total_bytes
                );
                self.lock().progress = Some(aggregate);
            }
            Err(e) => tracing::debug!("Progress unavailable: {}", e),
        }
    }

    async fn finish_completed(&self, course_ids: Vec<i64>, token: &CancellationToken) {
        tracing::info!("Sync job completed for {} course(s)", course_ids.len());

        let refreshed = tokio::select! {
            _ = token.cancelled() => return,
            refreshed = self.silent_refresh(&course_ids) => refreshed,
        };

        match refreshed {
            Ok(()) => {
                let _session = self.lock();
                self.set_phase(SyncPhase::Ready);
            }
            Err(e) => {
                tracing::warn!("Silent refresh failed, falling back to a full refresh: {}", e);
                self.full_refresh().await;
            }
        }

        self.emit(EngineEvent::SyncCompleted { course_ids });
    }

    async fn finish_failed(&self, error: SyncError) {
        tracing::error!("Sync job did not complete: {}", error);
        self.emit(EngineEvent::SyncFailed(error.message()));
        self.full_refresh().await;
    }

    async fn full_refresh(&self) {
        {
            let mut session = self.lock();
            session.job = None;
            session.optimistic_removed.clear();
        }
        match self.run_load(LoadRequest::Previous, false).await {
            Ok(()) => {}
            Err(SyncError::Cancelled) => tracing::debug!("Full refresh superseded"),
            Err(e) => tracing::error!("Full refresh failed: {}", e),
        }
    }

    /// Re-fetch only the synced courses and merge them into the live tree.
    ///
    /// Other courses keep their working selection untouched.
    async fn silent_refresh(&self, course_ids: &[i64]) -> Result<()> {
        let courses: Vec<Course> = {
            let session = self.lock();
            let tree = session
                .tree
                .as_ref()
                .ok_or_else(|| SyncError::InvalidState("No content loaded".to_string()))?;
            course_ids
                .iter()
                .filter_map(|id| tree.entry(*id))
                .map(|entry| entry.course.clone())
                .collect()
        };

        let refreshed = fetch::fetch_courses(&self.inner.collaborators, courses).await?;

        let mut guard = self.lock();
        let session = &mut *guard;
        let tree = session
            .tree
            .as_mut()
            .ok_or_else(|| SyncError::InvalidState("No content loaded".to_string()))?;

        let count = refreshed.len();
        for loaded in refreshed {
            let baseline = tree.upsert_course(loaded);
            session.reconciler.rebaseline(baseline);
        }
        session.optimistic_removed.clear();
        session.job = None;

        tracing::info!("Silently refreshed {} course(s)", count);
        Ok(())
    }
}
