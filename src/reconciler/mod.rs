//! Working-vs-original settings reconciliation and the commit path.

use std::sync::Arc;

use crate::errors::{Result, SyncError};
use crate::external::SyncSettingsStore;
use crate::models::FileSyncSetting;
use crate::selection::{CourseSelection, SelectionSnapshot, SelectionTree};

/// Rows to persist for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCommit {
    pub selection: CourseSelection,
    /// Empty when the course is in full file sync mode
    pub files: Vec<FileSyncSetting>,
}

impl CourseCommit {
    pub fn course_id(&self) -> i64 {
        self.selection.settings.course_id
    }
}

/// Outcome of a best-effort batch commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub committed: Vec<i64>,
    pub failed: Vec<(i64, SyncError)>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<i64>> {
        if self.failed.is_empty() {
            return Ok(self.committed);
        }
        let failed_courses: Vec<i64> = self.failed.iter().map(|(id, _)| *id).collect();
        let message = format!(
            "Failed to save sync settings for {} course(s): {}",
            failed_courses.len(),
            self.failed
                .iter()
                .map(|(id, err)| format!("{} ({})", id, err.message()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Err(SyncError::Persistence {
            message,
            failed_courses,
        })
    }
}

/// Owns the original snapshot and persists the working one.
#[derive(Clone)]
pub struct SettingsReconciler {
    store: Arc<dyn SyncSettingsStore>,
    original: SelectionSnapshot,
}

impl SettingsReconciler {
    pub fn new(store: Arc<dyn SyncSettingsStore>, original: SelectionSnapshot) -> Self {
        Self { store, original }
    }

    pub fn store(&self) -> Arc<dyn SyncSettingsStore> {
        Arc::clone(&self.store)
    }

    pub fn original(&self) -> &SelectionSnapshot {
        &self.original
    }

    pub fn has_unsaved_changes(&self, tree: &SelectionTree) -> bool {
        !self.unsaved_courses(tree).is_empty()
    }

    pub fn unsaved_courses(&self, tree: &SelectionTree) -> Vec<i64> {
        tree.working().differing_courses(&self.original)
    }

    /// Build the minimal rows for every course in the working snapshot.
    pub fn prepare_commit(&self, tree: &SelectionTree) -> Vec<CourseCommit> {
        tree.entries()
            .filter_map(|entry| {
                let selection = tree.selection(entry.course.id)?;
                let files = if selection.settings.full_file_sync {
                    Vec::new()
                } else {
                    selection
                        .selected_files
                        .iter()
                        .filter_map(|id| entry.file(*id))
                        .map(|file| FileSyncSetting {
                            id: file.id,
                            display_name: file.display_name.clone(),
                            course_id: file.course_id,
                            url: file.url.clone(),
                        })
                        .collect()
                };
                Some(CourseCommit {
                    selection: selection.clone(),
                    files,
                })
            })
            .collect()
    }

    /// Save each course independently; a failure does not roll back others.
    pub async fn persist(store: &dyn SyncSettingsStore, batch: &[CourseCommit]) -> CommitReport {
        let mut report = CommitReport::default();
        for commit in batch {
            let course_id = commit.course_id();
            match store.save(&commit.selection.settings, &commit.files).await {
                Ok(()) => {
                    tracing::debug!("Committed sync settings for course {}", course_id);
                    report.committed.push(course_id);
                }
                Err(e) => {
                    tracing::error!("Failed to commit sync settings for course {}: {}", course_id, e);
                    report.failed.push((course_id, e));
                }
            }
        }
        report
    }

    /// Make committed courses part of the new original snapshot.
    pub fn promote(&mut self, batch: &[CourseCommit], report: &CommitReport) {
        for commit in batch {
            if report.committed.contains(&commit.course_id()) {
                self.original.insert(commit.selection.clone());
            }
        }
    }

    /// Persist the working snapshot and promote what was saved.
    pub async fn commit(&mut self, tree: &SelectionTree) -> CommitReport {
        let batch = self.prepare_commit(tree);
        let report = Self::persist(self.store.as_ref(), &batch).await;
        self.promote(&batch, &report);
        tracing::info!(
            "Committed {} course(s), {} failed",
            report.committed.len(),
            report.failed.len()
        );
        report
    }

    /// Drop every in-memory toggle.
    pub fn discard(&self, tree: &mut SelectionTree) {
        tree.reset_working(self.original.clone());
    }

    /// Replace the baseline of one course after a server-confirmed refresh.
    pub fn rebaseline(&mut self, selection: CourseSelection) {
        self.original.insert(selection);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{CourseSyncSetting, CourseSyncSettingsWithFiles};
    use crate::selection::test_support::{file, loaded};

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<HashMap<i64, (CourseSyncSetting, Vec<FileSyncSetting>)>>,
        failing: HashSet<i64>,
    }

    #[async_trait]
    impl SyncSettingsStore for RecordingStore {
        async fn find(&self, course_id: i64) -> Result<Option<CourseSyncSettingsWithFiles>> {
            let saved = self.saved.lock().unwrap();
            Ok(saved.get(&course_id).map(|(settings, files)| CourseSyncSettingsWithFiles {
                settings: settings.clone(),
                files: files.clone(),
            }))
        }

        async fn save(&self, settings: &CourseSyncSetting, files: &[FileSyncSetting]) -> Result<()> {
            if self.failing.contains(&settings.course_id) {
                return Err(SyncError::Database("disk full".to_string()));
            }
            self.saved
                .lock()
                .unwrap()
                .insert(settings.course_id, (settings.clone(), files.to_vec()));
            Ok(())
        }
    }

    fn two_courses() -> (SelectionTree, SelectionSnapshot) {
        SelectionTree::populate(vec![
            loaded(1, &["pages", "files"], vec![file(1, 10, 100), file(1, 11, 100)], None),
            loaded(2, &["pages", "files"], vec![file(2, 20, 100)], None),
        ])
    }

    #[tokio::test]
    async fn test_no_unsaved_changes_after_load_and_commit() {
        let (mut tree, original) = two_courses();
        let store = Arc::new(RecordingStore::default());
        let mut reconciler = SettingsReconciler::new(store.clone(), original);
        assert!(!reconciler.has_unsaved_changes(&tree));

        tree.toggle_file(1, 10, true);
        assert!(reconciler.has_unsaved_changes(&tree));

        let report = reconciler.commit(&tree).await;

        assert!(report.is_success());
        assert_eq!(report.committed, vec![1, 2]);
        assert!(!reconciler.has_unsaved_changes(&tree));
        let saved = store.saved.lock().unwrap();
        let (settings, files) = saved.get(&1).unwrap();
        assert!(!settings.full_file_sync);
        assert_eq!(files.iter().map(|f| f.id).collect::<Vec<_>>(), vec![10]);
    }

    #[tokio::test]
    async fn test_full_file_sync_commits_without_file_rows() {
        let (mut tree, original) = two_courses();
        let store = Arc::new(RecordingStore::default());
        let mut reconciler = SettingsReconciler::new(store.clone(), original);

        tree.toggle_tab(1, "files", true);
        reconciler.commit(&tree).await;

        let saved = store.saved.lock().unwrap();
        let (settings, files) = saved.get(&1).unwrap();
        assert!(settings.full_file_sync);
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_partial_commit_failure_keeps_other_courses() {
        let (mut tree, original) = two_courses();
        let store = Arc::new(RecordingStore {
            failing: HashSet::from([2]),
            ..Default::default()
        });
        let mut reconciler = SettingsReconciler::new(store, original);

        tree.toggle_course(1, true);
        tree.toggle_course(2, true);
        let report = reconciler.commit(&tree).await;

        assert_eq!(report.committed, vec![1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(reconciler.unsaved_courses(&tree), vec![2]);
        assert!(reconciler.original().get(1).unwrap().has_selection());

        match report.into_result() {
            Err(SyncError::Persistence { failed_courses, .. }) => {
                assert_eq!(failed_courses, vec![2])
            }
            other => panic!("Expected persistence error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_discard_restores_original() {
        let (mut tree, original) = two_courses();
        let reconciler = SettingsReconciler::new(Arc::new(RecordingStore::default()), original.clone());

        tree.toggle_all(true);
        assert!(reconciler.has_unsaved_changes(&tree));

        reconciler.discard(&mut tree);

        assert!(!reconciler.has_unsaved_changes(&tree));
        assert_eq!(tree.working(), &original);
    }
}
