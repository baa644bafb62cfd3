//! Session driver: loading, toggle intents, commit and the sync job.
//!
//! All session state sits behind one mutex that is never held across an
//! await. Phase changes are published on a `watch` channel and one-shot
//! notifications on a `broadcast` channel. Every background task hangs off
//! the session cancellation token, so `shutdown()` stops all of them.

mod fetch;
mod job;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{Result, SyncError};
use crate::external::{ContentCatalog, JobHandle, LocalFileIndex, StorageProbe, SyncScheduler, SyncSettingsStore};
use crate::models::{
    format_short_file_size, CheckedState, CourseNode, LocalAvailability, StorageInfo,
    SyncConfirmation,
};
use crate::progress::AggregateProgress;
use crate::reconciler::{CourseCommit, SettingsReconciler};
use crate::selection::{SelectionSnapshot, SelectionTree, TreeEntity};
use crate::storage::StorageAccountant;

const EVENT_CAPACITY: usize = 64;

/// External collaborators shared by the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ContentCatalog>,
    pub store: Arc<dyn SyncSettingsStore>,
    pub probe: Arc<dyn StorageProbe>,
    pub local_index: Arc<dyn LocalFileIndex>,
    pub scheduler: Arc<dyn SyncScheduler>,
}

/// Engine lifecycle phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Loading,
    Ready,
    /// Waiting for the user to confirm the projected download
    Confirming(SyncConfirmation),
    Syncing,
    Error(String),
}

impl SyncPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SyncPhase::Loading => "LOADING",
            SyncPhase::Ready => "READY",
            SyncPhase::Confirming(_) => "CONFIRMING",
            SyncPhase::Syncing => "SYNCING",
            SyncPhase::Error(_) => "ERROR",
        }
    }
}

/// One-shot notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The sync job was handed to the scheduler; leave the selection screen
    NavigateBack,
    /// Non-fatal message to show the user
    Notice(String),
    SyncCompleted { course_ids: Vec<i64> },
    SyncFailed(String),
    /// A full load finished and the tree was replaced
    Refreshed,
}

/// Scope for `run_load`: a new one, or the one of the last load.
enum LoadRequest {
    Scoped(Option<i64>),
    Previous,
}

struct Session {
    scope: Option<i64>,
    tree: Option<SelectionTree>,
    reconciler: SettingsReconciler,
    job: Option<JobHandle>,
    /// Files reported as removed locally until the job outcome is known
    optimistic_removed: HashSet<i64>,
    progress: Option<AggregateProgress>,
}

struct Inner {
    collaborators: Collaborators,
    config: Arc<Config>,
    accountant: StorageAccountant,
    session: Mutex<Session>,
    phase: watch::Sender<SyncPhase>,
    events: broadcast::Sender<EngineEvent>,
    shutdown: CancellationToken,
    load_generation: AtomicU64,
    load_token: Mutex<Option<CancellationToken>>,
}

/// Offline sync engine for one screen session.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    pub fn new(collaborators: Collaborators, config: Config) -> Self {
        let accountant = StorageAccountant::new(
            Arc::clone(&collaborators.probe),
            Arc::clone(&collaborators.local_index),
            config.tab_unit_size,
        );
        let session = Session {
            scope: None,
            tree: None,
            reconciler: SettingsReconciler::new(
                Arc::clone(&collaborators.store),
                SelectionSnapshot::default(),
            ),
            job: None,
            optimistic_removed: HashSet::new(),
            progress: None,
        };
        let (phase, _) = watch::channel(SyncPhase::Loading);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                collaborators,
                config: Arc::new(config),
                accountant,
                session: Mutex::new(session),
                phase,
                events,
                shutdown: CancellationToken::new(),
                load_generation: AtomicU64::new(0),
                load_token: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn state(&self) -> SyncPhase {
        self.inner.phase.borrow().clone()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.inner.phase.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    // ---- Loading ----

    /// Load the catalog, optionally scoped to one course.
    ///
    /// A newer load cancels any load still in flight; the superseded call
    /// returns `SyncError::Cancelled`.
    pub async fn load(&self, scope: Option<i64>) -> Result<()> {
        self.run_load(LoadRequest::Scoped(scope), true).await
    }

    /// Reload with the scope of the last load.
    pub async fn refresh(&self) -> Result<()> {
        self.run_load(LoadRequest::Previous, true).await
    }

    /// User loads are rejected while SYNCING. The phase is checked and moved
    /// to LOADING under one session lock so a concurrent `confirm_sync`
    /// cannot be overwritten.
    async fn run_load(&self, request: LoadRequest, user_initiated: bool) -> Result<()> {
        let (scope, generation, token) = {
            let mut session = self.lock();
            if user_initiated && self.state() == SyncPhase::Syncing {
                tracing::warn!("Rejecting load while a sync is running");
                return Err(SyncError::InvalidState(
                    "Cannot load while a sync is running".to_string(),
                ));
            }
            if let LoadRequest::Scoped(scope) = request {
                session.scope = scope;
            }
            let (generation, token) = self.begin_load();
            self.set_phase(SyncPhase::Loading);
            (session.scope, generation, token)
        };
        tracing::info!("Loading offline content (scope: {:?})", scope);

        let result = tokio::select! {
            _ = token.cancelled() => Err(SyncError::Cancelled),
            result = fetch::fetch_catalog(&self.inner.collaborators, scope) => result,
        };

        let mut session = self.lock();
        if self.inner.load_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding superseded load {}", generation);
            return Err(SyncError::Cancelled);
        }

        match result {
            Ok(loaded) => {
                let (tree, original) = SelectionTree::populate(loaded);
                tracing::info!("Loaded {} course(s)", tree.course_ids().len());
                session.tree = Some(tree);
                session.reconciler =
                    SettingsReconciler::new(Arc::clone(&self.inner.collaborators.store), original);
                session.optimistic_removed.clear();
                self.set_phase(SyncPhase::Ready);
                self.emit(EngineEvent::Refreshed);
                Ok(())
            }
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(e) => {
                tracing::error!("Failed to load offline content: {}", e);
                session.tree = None;
                session.reconciler = SettingsReconciler::new(
                    Arc::clone(&self.inner.collaborators.store),
                    SelectionSnapshot::default(),
                );
                session.optimistic_removed.clear();
                self.set_phase(SyncPhase::Error(e.message()));
                Err(e)
            }
        }
    }

    fn begin_load(&self) -> (u64, CancellationToken) {
        let token = self.inner.shutdown.child_token();
        let mut current = self
            .inner
            .load_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.inner.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        (generation, token)
    }

    // ---- Toggle intents ----

    pub fn toggle_course(&self, course_id: i64, checked: bool) -> bool {
        self.with_ready_tree("course toggle", |tree| tree.toggle_course(course_id, checked))
            .unwrap_or(false)
    }

    pub fn toggle_tab(&self, course_id: i64, tab_id: &str, checked: bool) -> bool {
        self.with_ready_tree("tab toggle", |tree| tree.toggle_tab(course_id, tab_id, checked))
            .unwrap_or(false)
    }

    pub fn toggle_file(&self, course_id: i64, file_id: i64, checked: bool) -> bool {
        self.with_ready_tree("file toggle", |tree| tree.toggle_file(course_id, file_id, checked))
            .unwrap_or(false)
    }

    pub fn toggle_all(&self, checked: bool) -> bool {
        self.with_ready_tree("bulk toggle", |tree| tree.toggle_all(checked))
            .is_some()
    }

    /// Select everything when nothing is selected, otherwise clear everything.
    /// Returns the applied value, or `None` when ignored.
    pub fn toggle_selection(&self) -> Option<bool> {
        self.with_ready_tree("bulk toggle", SelectionTree::toggle_selection)
    }

    /// Drop every unsaved toggle.
    pub fn discard_changes(&self) -> bool {
        let mut guard = self.lock();
        let phase = self.state();
        if phase != SyncPhase::Ready {
            tracing::warn!("Ignoring discard while {}", phase.name());
            return false;
        }
        let session = &mut *guard;
        match session.tree.as_mut() {
            Some(tree) => {
                session.reconciler.discard(tree);
                tracing::info!("Discarded unsaved selection changes");
                true
            }
            None => false,
        }
    }

    fn with_ready_tree<R>(
        &self,
        intent: &str,
        apply: impl FnOnce(&mut SelectionTree) -> R,
    ) -> Option<R> {
        let mut session = self.lock();
        let phase = self.state();
        if phase != SyncPhase::Ready {
            tracing::warn!("Ignoring {} while {}", intent, phase.name());
            return None;
        }
        session.tree.as_mut().map(apply)
    }

    // ---- Read views ----

    /// Owned tree view with local availability and optimistic removals applied.
    pub fn tree_snapshot(&self) -> Vec<CourseNode> {
        let session = self.lock();
        let Some(tree) = session.tree.as_ref() else {
            return Vec::new();
        };
        let accountant = &self.inner.accountant;
        tree.nodes(|file| {
            if session.optimistic_removed.contains(&file.id) {
                LocalAvailability::NotDownloaded
            } else {
                accountant.availability(file)
            }
        })
    }

    pub fn checked_state(&self, entity: TreeEntity) -> Option<CheckedState> {
        self.lock().tree.as_ref()?.checked_state(entity)
    }

    pub fn storage_info(&self) -> StorageInfo {
        let session = self.lock();
        match session.tree.as_ref() {
            Some(tree) => self
                .inner
                .accountant
                .storage_info(tree, session.reconciler.original()),
            None => self
                .inner
                .accountant
                .storage_info(&SelectionTree::default(), &SelectionSnapshot::default()),
        }
    }

    pub fn selected_count(&self) -> usize {
        self.lock()
            .tree
            .as_ref()
            .map_or(0, SelectionTree::selected_count)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        let session = self.lock();
        session
            .tree
            .as_ref()
            .is_some_and(|tree| session.reconciler.has_unsaved_changes(tree))
    }

    pub fn unsaved_courses(&self) -> Vec<i64> {
        let session = self.lock();
        session
            .tree
            .as_ref()
            .map(|tree| session.reconciler.unsaved_courses(tree))
            .unwrap_or_default()
    }

    /// Latest aggregate progress of the running job, if reported.
    pub fn sync_progress(&self) -> Option<AggregateProgress> {
        self.lock().progress.clone()
    }

    pub fn active_job(&self) -> Option<JobHandle> {
        self.lock().job.clone()
    }

    // ---- Sync ----

    /// Move to CONFIRMING with the projected download size.
    pub fn request_sync(&self) -> Result<SyncConfirmation> {
        let session = self.lock();
        let phase = self.state();
        if phase != SyncPhase::Ready {
            return Err(SyncError::InvalidState(format!(
                "Cannot request a sync while {}",
                phase.name()
            )));
        }
        let tree = session
            .tree
            .as_ref()
            .ok_or_else(|| SyncError::InvalidState("No content loaded".to_string()))?;

        let projected_bytes = self.inner.accountant.projected_sync_size(tree);
        let confirmation = SyncConfirmation {
            projected_bytes,
            projected_size_label: format_short_file_size(projected_bytes),
            wifi_only: self.inner.config.wifi_only,
        };
        self.set_phase(SyncPhase::Confirming(confirmation.clone()));
        Ok(confirmation)
    }

    pub fn cancel_sync_request(&self) -> bool {
        let _session = self.lock();
        if matches!(self.state(), SyncPhase::Confirming(_)) {
            self.set_phase(SyncPhase::Ready);
            true
        } else {
            false
        }
    }

    /// Commit the working selection and hand the job to the scheduler.
    ///
    /// Every course with a selection or an unsaved change is submitted, so
    /// deselected content gets removed from the device. If any course fails
    /// to commit, nothing is submitted and the engine returns to READY;
    /// courses that did commit stay committed.
    pub async fn confirm_sync(&self) -> Result<()> {
        let (store, batch, changed) = {
            let session = self.lock();
            if !matches!(self.state(), SyncPhase::Confirming(_)) {
                return Err(SyncError::InvalidState(
                    "No sync request to confirm".to_string(),
                ));
            }
            let tree = session
                .tree
                .as_ref()
                .ok_or_else(|| SyncError::InvalidState("No content loaded".to_string()))?;
            let batch = session.reconciler.prepare_commit(tree);
            let changed: HashSet<i64> =
                session.reconciler.unsaved_courses(tree).into_iter().collect();
            self.set_phase(SyncPhase::Syncing);
            (session.reconciler.store(), batch, changed)
        };

        let report = SettingsReconciler::persist(store.as_ref(), &batch).await;

        let course_ids: Vec<i64> = batch
            .iter()
            .filter(|commit| {
                commit.selection.has_selection() || changed.contains(&commit.course_id())
            })
            .map(CourseCommit::course_id)
            .collect();

        let removed = {
            let mut session = self.lock();
            let removed = optimistic_removals(&self.inner.accountant, &session);
            session.reconciler.promote(&batch, &report);

            if let Err(e) = report.into_result() {
                tracing::error!("Sync settings commit failed: {}", e);
                self.set_phase(SyncPhase::Ready);
                self.emit(EngineEvent::Notice(e.message()));
                return Err(e);
            }
            if course_ids.is_empty() {
                tracing::info!("Nothing selected or changed, skipping sync job");
                self.set_phase(SyncPhase::Ready);
                self.emit(EngineEvent::NavigateBack);
                return Ok(());
            }
            removed
        };

        let handle = match self.inner.collaborators.scheduler.submit(&course_ids).await {
            Ok(handle) => handle,
            Err(e) => {
                let e = match e {
                    SyncError::SyncSubmission(_) => e,
                    other => SyncError::SyncSubmission(other.message()),
                };
                tracing::error!("Sync job rejected: {}", e);
                self.set_phase(SyncPhase::Ready);
                self.emit(EngineEvent::Notice(e.message()));
                return Err(e);
            }
        };

        let token = self.inner.shutdown.child_token();
        {
            let mut session = self.lock();
            session.optimistic_removed = removed;
            session.progress = None;
            session.job = Some(handle.clone());
        }
        tracing::info!(
            "Submitted sync job {} for {} course(s)",
            handle.0,
            course_ids.len()
        );
        self.emit(EngineEvent::NavigateBack);

        let span = tracing::info_span!("sync_job", sync_id = %Uuid::new_v4(), job = %handle.0);
        tokio::spawn(
            self.clone()
                .run_job(handle, course_ids, token)
                .instrument(span),
        );
        Ok(())
    }

    /// Cancel every load and poll task of this session.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down offline sync session");
        self.inner.shutdown.cancel();
    }

    // ---- Internals ----

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SyncPhase) {
        let name = phase.name();
        let previous = self.inner.phase.send_replace(phase);
        if previous.name() != name {
            tracing::info!("Phase {} -> {}", previous.name(), name);
        }
    }

    fn emit(&self, event: EngineEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

}

/// Files selected in the baseline, deselected now and present on the device.
fn optimistic_removals(accountant: &StorageAccountant, session: &Session) -> HashSet<i64> {
    let mut removed = HashSet::new();
    let Some(tree) = session.tree.as_ref() else {
        return removed;
    };
    let original = session.reconciler.original();

    for entry in tree.entries() {
        let Some(was) = original.get(entry.course.id) else {
            continue;
        };
        let now = tree.selection(entry.course.id);
        for file in &entry.files {
            let deselected = was.selected_files.contains(&file.id)
                && !now.is_some_and(|s| s.selected_files.contains(&file.id));
            if deselected && accountant.availability(file) != LocalAvailability::NotDownloaded {
                removed.insert(file.id);
            }
        }
    }
    removed
}
