//! Three-level selection tree (course -> tabs -> files).
//!
//! Leaf truth is the per-tab flag map and the selected-file set. The
//! `full_file_sync` and `full_content_sync` flags are recomputed from it after
//! every mutation, and tri-state checkbox values are derived on read.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{
    format_short_file_size, CheckedState, ContentTab, Course, CourseNode, CourseSyncSetting,
    CourseSyncSettingsWithFiles, FileNode, LocalAvailability, RemoteFile, TabKind, TabNode,
};

/// Working or original selection of one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSelection {
    pub settings: CourseSyncSetting,
    pub selected_files: BTreeSet<i64>,
}

impl CourseSelection {
    pub fn empty(course_id: i64) -> Self {
        Self {
            settings: CourseSyncSetting::empty(course_id),
            selected_files: BTreeSet::new(),
        }
    }

    /// True when anything under the course is selected.
    pub fn has_selection(&self) -> bool {
        self.settings.full_file_sync
            || !self.selected_files.is_empty()
            || self.settings.tabs.values().any(|selected| *selected)
    }

    fn selected_leaves(&self) -> (BTreeSet<&str>, &BTreeSet<i64>) {
        let tabs = self
            .settings
            .tabs
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.as_str())
            .collect();
        (tabs, &self.selected_files)
    }
}

/// Selection state of every loaded course, keyed by course id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    courses: BTreeMap<i64, CourseSelection>,
}

impl SelectionSnapshot {
    pub fn get(&self, course_id: i64) -> Option<&CourseSelection> {
        self.courses.get(&course_id)
    }

    pub fn insert(&mut self, selection: CourseSelection) {
        self.courses
            .insert(selection.settings.course_id, selection);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &CourseSelection)> {
        self.courses.iter()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Course ids whose non-empty selections differ between the two snapshots.
    ///
    /// A course with nothing selected counts the same as an absent course.
    pub fn differing_courses(&self, other: &SelectionSnapshot) -> Vec<i64> {
        let ids: BTreeSet<i64> = self
            .courses
            .keys()
            .chain(other.courses.keys())
            .copied()
            .collect();

        ids.into_iter()
            .filter(|id| {
                let ours = self
                    .get(*id)
                    .filter(|s| s.has_selection())
                    .map(CourseSelection::selected_leaves);
                let theirs = other
                    .get(*id)
                    .filter(|s| s.has_selection())
                    .map(CourseSelection::selected_leaves);
                ours != theirs
            })
            .collect()
    }
}

/// An allow-listed tab of a loaded course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEntry {
    pub kind: TabKind,
    pub label: String,
}

/// Catalog data of one loaded course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseEntry {
    pub course: Course,
    pub tabs: Vec<TabEntry>,
    pub files: Vec<RemoteFile>,
}

impl CourseEntry {
    pub fn has_tab(&self, kind: TabKind) -> bool {
        self.tabs.iter().any(|tab| tab.kind == kind)
    }

    pub fn has_files_tab(&self) -> bool {
        self.has_tab(TabKind::Files)
    }

    pub fn file(&self, file_id: i64) -> Option<&RemoteFile> {
        self.files.iter().find(|file| file.id == file_id)
    }

    pub fn total_file_size(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }
}

/// Everything fetched for one course during a load.
#[derive(Debug, Clone)]
pub struct LoadedCourse {
    pub course: Course,
    pub tabs: Vec<ContentTab>,
    pub files: Vec<RemoteFile>,
    pub settings: Option<CourseSyncSettingsWithFiles>,
}

/// Node addressed by a tri-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntity {
    Course(i64),
    Tab { course_id: i64, tab: TabKind },
}

/// In-memory selection tree with the working snapshot.
#[derive(Debug, Clone, Default)]
pub struct SelectionTree {
    order: Vec<i64>,
    entries: BTreeMap<i64, CourseEntry>,
    working: SelectionSnapshot,
}

impl SelectionTree {
    /// Build the tree and return it with the baseline snapshot.
    ///
    /// The working snapshot starts out identical to the returned baseline.
    pub fn populate(loaded: Vec<LoadedCourse>) -> (Self, SelectionSnapshot) {
        let mut tree = SelectionTree::default();
        for course in loaded {
            tree.upsert_course(course);
        }
        let baseline = tree.working.clone();
        (tree, baseline)
    }

    /// Insert or replace one course; its working selection is reset to the
    /// persisted baseline, which is returned.
    pub fn upsert_course(&mut self, loaded: LoadedCourse) -> CourseSelection {
        let entry = build_entry(loaded.course, loaded.tabs, loaded.files);
        let baseline = baseline_selection(&entry, loaded.settings);
        let course_id = entry.course.id;

        if !self.entries.contains_key(&course_id) {
            self.order.push(course_id);
        }
        self.entries.insert(course_id, entry);
        self.working.insert(baseline.clone());
        baseline
    }

    pub fn course_ids(&self) -> &[i64] {
        &self.order
    }

    pub fn entry(&self, course_id: i64) -> Option<&CourseEntry> {
        self.entries.get(&course_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CourseEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn selection(&self, course_id: i64) -> Option<&CourseSelection> {
        self.working.get(course_id)
    }

    pub fn working(&self) -> &SelectionSnapshot {
        &self.working
    }

    /// Replace the working snapshot, e.g. when discarding unsaved toggles.
    pub fn reset_working(&mut self, snapshot: SelectionSnapshot) {
        self.working = snapshot;
    }

    /// Select or deselect everything under a course.
    pub fn toggle_course(&mut self, course_id: i64, checked: bool) -> bool {
        let Some(entry) = self.entries.get(&course_id) else {
            tracing::warn!("Ignoring toggle for unknown course {}", course_id);
            return false;
        };
        let Some(selection) = self.working.courses.get_mut(&course_id) else {
            return false;
        };

        for tab in &entry.tabs {
            selection.settings.set_tab(tab.kind, checked);
        }
        selection.settings.full_file_sync = checked && entry.has_files_tab();
        selection.settings.full_content_sync = checked;
        if checked {
            selection
                .selected_files
                .extend(entry.files.iter().map(|file| file.id));
        } else {
            selection.selected_files.clear();
        }
        recompute_derived(entry, selection);

        tracing::debug!("Course {} toggled to {}", course_id, checked);
        true
    }

    /// Flip one tab; the Files tab selects or deselects every file.
    pub fn toggle_tab(&mut self, course_id: i64, tab_id: &str, checked: bool) -> bool {
        let Some(entry) = self.entries.get(&course_id) else {
            tracing::warn!("Ignoring tab toggle for unknown course {}", course_id);
            return false;
        };
        let Some(kind) = TabKind::from_id(tab_id).filter(|kind| entry.has_tab(*kind)) else {
            tracing::warn!("Ignoring toggle for tab {} of course {}", tab_id, course_id);
            return false;
        };
        let Some(selection) = self.working.courses.get_mut(&course_id) else {
            return false;
        };

        if kind.is_files() {
            if checked {
                selection
                    .selected_files
                    .extend(entry.files.iter().map(|file| file.id));
            } else {
                selection.selected_files.clear();
            }
            selection.settings.full_file_sync = checked;
        }
        selection.settings.set_tab(kind, checked);
        recompute_derived(entry, selection);

        tracing::debug!("Tab {} of course {} toggled to {}", tab_id, course_id, checked);
        true
    }

    pub fn toggle_file(&mut self, course_id: i64, file_id: i64, checked: bool) -> bool {
        let Some(entry) = self.entries.get(&course_id) else {
            tracing::warn!("Ignoring file toggle for unknown course {}", course_id);
            return false;
        };
        if entry.file(file_id).is_none() {
            tracing::warn!("Ignoring toggle for unknown file {} in course {}", file_id, course_id);
            return false;
        }
        let Some(selection) = self.working.courses.get_mut(&course_id) else {
            return false;
        };

        if checked {
            selection.selected_files.insert(file_id);
        } else {
            selection.selected_files.remove(&file_id);
        }
        recompute_derived(entry, selection);

        tracing::debug!("File {} of course {} toggled to {}", file_id, course_id, checked);
        true
    }

    pub fn toggle_all(&mut self, checked: bool) {
        let ids = self.order.clone();
        for course_id in ids {
            self.toggle_course(course_id, checked);
        }
    }

    /// Select everything when nothing is selected, otherwise deselect everything.
    pub fn toggle_selection(&mut self) -> bool {
        let should_check = self.selected_count() == 0;
        self.toggle_all(should_check);
        should_check
    }

    /// Selected non-Files tabs plus selected files.
    pub fn selected_count(&self) -> usize {
        self.entries()
            .filter_map(|entry| Some((entry, self.working.get(entry.course.id)?)))
            .map(|(entry, selection)| {
                let tabs = entry
                    .tabs
                    .iter()
                    .filter(|tab| !tab.kind.is_files() && selection.settings.is_tab_selected(tab.kind))
                    .count();
                tabs + selection.selected_files.len()
            })
            .sum()
    }

    pub fn checked_state(&self, entity: TreeEntity) -> Option<CheckedState> {
        match entity {
            TreeEntity::Course(course_id) => self.course_state(course_id),
            TreeEntity::Tab { course_id, tab } => self.tab_state(course_id, tab),
        }
    }

    pub fn course_state(&self, course_id: i64) -> Option<CheckedState> {
        let entry = self.entries.get(&course_id)?;
        let selection = self.working.get(course_id)?;
        Some(CheckedState::aggregate(
            entry
                .tabs
                .iter()
                .map(|tab| derive_tab_state(entry, selection, tab.kind)),
        ))
    }

    pub fn tab_state(&self, course_id: i64, tab: TabKind) -> Option<CheckedState> {
        let entry = self.entries.get(&course_id)?;
        if !entry.has_tab(tab) {
            return None;
        }
        let selection = self.working.get(course_id)?;
        Some(derive_tab_state(entry, selection, tab))
    }

    /// Owned view of the whole tree for rendering.
    pub fn nodes<F>(&self, availability: F) -> Vec<CourseNode>
    where
        F: Fn(&RemoteFile) -> LocalAvailability,
    {
        self.entries()
            .filter_map(|entry| {
                let selection = self.working.get(entry.course.id)?;
                let tabs = entry
                    .tabs
                    .iter()
                    .map(|tab| {
                        let files = if tab.kind.is_files() {
                            entry
                                .files
                                .iter()
                                .map(|file| FileNode {
                                    file_id: file.id,
                                    name: file.display_name.clone(),
                                    size: file.size,
                                    size_label: format_short_file_size(file.size),
                                    checked: selection.selected_files.contains(&file.id),
                                    local: availability(file),
                                })
                                .collect()
                        } else {
                            Vec::new()
                        };
                        TabNode {
                            tab_id: tab.kind.as_str().to_string(),
                            label: tab.label.clone(),
                            state: derive_tab_state(entry, selection, tab.kind),
                            size: tab.kind.is_files().then(|| entry.total_file_size()),
                            files,
                        }
                    })
                    .collect::<Vec<_>>();

                let size = entry.total_file_size();
                Some(CourseNode {
                    course_id: entry.course.id,
                    name: entry.course.name.clone(),
                    state: CheckedState::aggregate(tabs.iter().map(|tab| tab.state)),
                    full_content_sync: selection.settings.full_content_sync,
                    size,
                    size_label: format_short_file_size(size),
                    tabs,
                })
            })
            .collect()
    }
}

fn build_entry(course: Course, tabs: Vec<ContentTab>, files: Vec<RemoteFile>) -> CourseEntry {
    let mut allowed: Vec<TabEntry> = Vec::new();
    for tab in &tabs {
        match tab.kind() {
            Some(kind) if !allowed.iter().any(|t| t.kind == kind) => allowed.push(TabEntry {
                kind,
                label: tab.label.clone(),
            }),
            _ => {}
        }
    }

    let course_id = course.id;
    let has_files_tab = allowed.iter().any(|tab| tab.kind.is_files());
    let files = if has_files_tab {
        files
            .into_iter()
            .filter(|file| file.course_id == course_id)
            .collect()
    } else {
        Vec::new()
    };

    CourseEntry {
        course: Course { tabs, ..course },
        tabs: allowed,
        files,
    }
}

fn baseline_selection(
    entry: &CourseEntry,
    persisted: Option<CourseSyncSettingsWithFiles>,
) -> CourseSelection {
    let course_id = entry.course.id;
    let Some(persisted) = persisted else {
        let mut selection = CourseSelection::empty(course_id);
        recompute_derived(entry, &mut selection);
        return selection;
    };

    let stored = persisted.settings;
    let mut settings = CourseSyncSetting::empty(course_id);
    settings.full_file_sync = stored.full_file_sync;
    for tab in &entry.tabs {
        let selected = if tab.kind.is_files() {
            stored.full_file_sync
        } else {
            stored.is_tab_selected(tab.kind)
        };
        settings.set_tab(tab.kind, selected);
    }

    let selected_files = if stored.full_file_sync {
        entry.files.iter().map(|file| file.id).collect()
    } else {
        persisted
            .files
            .iter()
            .map(|file| file.id)
            .filter(|id| entry.file(*id).is_some())
            .collect()
    };

    let mut selection = CourseSelection {
        settings,
        selected_files,
    };
    recompute_derived(entry, &mut selection);
    selection
}

/// Re-derive the full-sync flags and normalize the tab map from leaf state.
fn recompute_derived(entry: &CourseEntry, selection: &mut CourseSelection) {
    let settings = &mut selection.settings;
    settings
        .tabs
        .retain(|id, _| TabKind::from_id(id).is_some_and(|kind| entry.has_tab(kind)));
    for tab in &entry.tabs {
        settings.tabs.entry(tab.kind.as_str().to_string()).or_insert(false);
    }

    if entry.has_files_tab() {
        if !entry.files.is_empty() {
            settings.full_file_sync = selection.selected_files.len() == entry.files.len();
        }
        settings.set_tab(TabKind::Files, settings.full_file_sync);
    } else {
        settings.full_file_sync = false;
    }

    settings.full_content_sync = !entry.tabs.is_empty()
        && entry
            .tabs
            .iter()
            .all(|tab| settings.is_tab_selected(tab.kind));
}

fn derive_tab_state(entry: &CourseEntry, selection: &CourseSelection, tab: TabKind) -> CheckedState {
    if tab.is_files() && !entry.files.is_empty() {
        CheckedState::aggregate(
            entry
                .files
                .iter()
                .map(|file| CheckedState::from_bool(selection.selected_files.contains(&file.id))),
        )
    } else if tab.is_files() {
        CheckedState::from_bool(selection.settings.full_file_sync)
    } else {
        CheckedState::from_bool(selection.settings.is_tab_selected(tab))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::FileSyncSetting;

    pub fn file(course_id: i64, id: i64, size: u64) -> RemoteFile {
        RemoteFile {
            id,
            course_id,
            display_name: format!("File {}", id),
            size,
            url: format!("https://example.test/files/{}", id),
        }
    }

    pub fn loaded(
        course_id: i64,
        tab_ids: &[&str],
        files: Vec<RemoteFile>,
        settings: Option<CourseSyncSettingsWithFiles>,
    ) -> LoadedCourse {
        let tabs: Vec<ContentTab> = tab_ids
            .iter()
            .map(|id| ContentTab::new(*id, id.to_uppercase()))
            .collect();
        LoadedCourse {
            course: Course::new(course_id, format!("Course {}", course_id)),
            tabs,
            files,
            settings,
        }
    }

    pub fn persisted(
        course_id: i64,
        tabs: &[(&str, bool)],
        full_file_sync: bool,
        files: &[i64],
    ) -> CourseSyncSettingsWithFiles {
        let mut settings = CourseSyncSetting::empty(course_id);
        for (id, selected) in tabs {
            settings.tabs.insert(id.to_string(), *selected);
        }
        settings.full_file_sync = full_file_sync;
        CourseSyncSettingsWithFiles {
            settings,
            files: files
                .iter()
                .map(|id| FileSyncSetting {
                    id: *id,
                    display_name: format!("File {}", id),
                    course_id,
                    url: format!("https://example.test/files/{}", id),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn course_a() -> SelectionTree {
        let (tree, _) = SelectionTree::populate(vec![loaded(
            1,
            &["syllabus", "files"],
            vec![file(1, 10, 100), file(1, 11, 200)],
            None,
        )]);
        tree
    }

    #[test]
    fn test_files_tab_selects_all_files() {
        let mut tree = course_a();

        assert!(tree.toggle_tab(1, "files", true));

        let selection = tree.selection(1).unwrap();
        assert!(selection.settings.full_file_sync);
        assert_eq!(selection.selected_files, BTreeSet::from([10, 11]));
        assert_eq!(tree.tab_state(1, TabKind::Files), Some(CheckedState::Checked));
        assert_eq!(tree.course_state(1), Some(CheckedState::Indeterminate));
        assert!(!selection.settings.full_content_sync);
    }

    #[test]
    fn test_deselecting_one_file_clears_full_flags() {
        let mut tree = course_a();
        tree.toggle_course(1, true);
        assert!(tree.selection(1).unwrap().settings.full_content_sync);

        tree.toggle_file(1, 10, false);

        let selection = tree.selection(1).unwrap();
        assert!(!selection.settings.full_file_sync);
        assert!(!selection.settings.full_content_sync);
        assert!(selection.settings.is_tab_selected(TabKind::Syllabus));
        assert_eq!(
            tree.tab_state(1, TabKind::Files),
            Some(CheckedState::Indeterminate)
        );
        assert_eq!(tree.course_state(1), Some(CheckedState::Indeterminate));
    }

    #[test]
    fn test_selecting_every_leaf_checks_course() {
        let mut tree = course_a();
        tree.toggle_tab(1, "syllabus", true);
        tree.toggle_file(1, 10, true);
        assert_eq!(tree.course_state(1), Some(CheckedState::Indeterminate));

        tree.toggle_file(1, 11, true);

        let selection = tree.selection(1).unwrap();
        assert!(selection.settings.full_file_sync);
        assert!(selection.settings.full_content_sync);
        assert_eq!(tree.course_state(1), Some(CheckedState::Checked));
        assert_eq!(
            tree.checked_state(TreeEntity::Course(1)),
            Some(CheckedState::Checked)
        );
    }

    #[test]
    fn test_course_toggle_round_trip_restores_selection() {
        let mut tree = course_a();
        let before = tree.selection(1).unwrap().clone();

        tree.toggle_course(1, true);
        assert_eq!(tree.course_state(1), Some(CheckedState::Checked));
        tree.toggle_course(1, false);

        assert_eq!(tree.selection(1).unwrap(), &before);
        assert_eq!(tree.course_state(1), Some(CheckedState::Unchecked));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut tree = course_a();
        let before = tree.working().clone();

        assert!(!tree.toggle_course(99, true));
        assert!(!tree.toggle_tab(1, "pages", true));
        assert!(!tree.toggle_tab(1, "collaborations", true));
        assert!(!tree.toggle_file(1, 999, true));

        assert_eq!(tree.working(), &before);
    }

    #[test]
    fn test_disallowed_tabs_are_dropped() {
        let (tree, _) = SelectionTree::populate(vec![loaded(
            1,
            &["pages", "collaborations", "files"],
            vec![],
            None,
        )]);

        let kinds: Vec<TabKind> = tree.entry(1).unwrap().tabs.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TabKind::Pages, TabKind::Files]);
        let tab_keys: Vec<&String> = tree.selection(1).unwrap().settings.tabs.keys().collect();
        assert_eq!(tab_keys, vec!["files", "pages"]);
    }

    #[test]
    fn test_files_are_ignored_without_files_tab() {
        let (tree, _) = SelectionTree::populate(vec![loaded(
            1,
            &["pages"],
            vec![file(1, 10, 100)],
            None,
        )]);
        assert!(tree.entry(1).unwrap().files.is_empty());
    }

    #[test]
    fn test_baseline_from_persisted_settings() {
        let (tree, baseline) = SelectionTree::populate(vec![
            loaded(
                1,
                &["pages", "files"],
                vec![file(1, 10, 100), file(1, 11, 200)],
                Some(persisted(1, &[("pages", true)], false, &[10, 12])),
            ),
            loaded(
                2,
                &["files"],
                vec![file(2, 20, 100), file(2, 21, 100)],
                Some(persisted(2, &[], true, &[])),
            ),
        ]);

        let first = tree.selection(1).unwrap();
        assert_eq!(first.selected_files, BTreeSet::from([10]));
        assert!(first.settings.is_tab_selected(TabKind::Pages));
        assert_eq!(tree.course_state(1), Some(CheckedState::Indeterminate));

        let second = tree.selection(2).unwrap();
        assert_eq!(second.selected_files, BTreeSet::from([20, 21]));
        assert!(second.settings.full_content_sync);
        assert_eq!(tree.course_state(2), Some(CheckedState::Checked));

        assert_eq!(tree.working(), &baseline);
    }

    #[test]
    fn test_full_file_sync_cleared_without_files_tab() {
        let (mut tree, baseline) = SelectionTree::populate(vec![loaded(
            1,
            &["pages"],
            vec![],
            Some(persisted(1, &[], true, &[])),
        )]);

        let selection = tree.selection(1).unwrap();
        assert!(!selection.settings.full_file_sync);
        assert!(!selection.has_selection());
        assert_eq!(tree.selected_count(), 0);

        tree.toggle_course(1, false);
        assert!(tree.working().differing_courses(&baseline).is_empty());

        tree.toggle_course(1, true);
        let selection = tree.selection(1).unwrap();
        assert!(!selection.settings.full_file_sync);
        assert!(selection.settings.full_content_sync);
        assert_eq!(tree.course_state(1), Some(CheckedState::Checked));
    }

    #[test]
    fn test_empty_files_tab_keeps_toggled_state() {
        let (mut tree, _) = SelectionTree::populate(vec![loaded(1, &["pages", "files"], vec![], None)]);

        tree.toggle_tab(1, "files", true);
        assert_eq!(tree.tab_state(1, TabKind::Files), Some(CheckedState::Checked));
        tree.toggle_tab(1, "pages", true);
        assert!(tree.selection(1).unwrap().settings.full_content_sync);
    }

    #[test]
    fn test_selected_count_and_toggle_selection() {
        let (mut tree, _) = SelectionTree::populate(vec![
            loaded(1, &["pages", "syllabus", "files"], vec![file(1, 10, 100)], None),
            loaded(2, &["assignments"], vec![], None),
        ]);
        assert_eq!(tree.selected_count(), 0);

        assert!(tree.toggle_selection());
        assert_eq!(tree.selected_count(), 2 + 1 + 1);

        assert!(!tree.toggle_selection());
        assert_eq!(tree.selected_count(), 0);
    }

    #[test]
    fn test_differing_courses_ignores_empty_entries() {
        let (mut tree, baseline) = SelectionTree::populate(vec![
            loaded(1, &["pages"], vec![], None),
            loaded(2, &["pages"], vec![], None),
        ]);
        assert!(tree.working().differing_courses(&baseline).is_empty());
        assert!(tree
            .working()
            .differing_courses(&SelectionSnapshot::default())
            .is_empty());

        tree.toggle_tab(2, "pages", true);
        assert_eq!(tree.working().differing_courses(&baseline), vec![2]);

        tree.toggle_tab(2, "pages", false);
        assert!(tree.working().differing_courses(&baseline).is_empty());
    }

    #[test]
    fn test_nodes_reflect_selection() {
        let mut tree = course_a();
        tree.toggle_file(1, 11, true);

        let nodes = tree.nodes(|_| LocalAvailability::NotDownloaded);

        assert_eq!(nodes.len(), 1);
        let course = &nodes[0];
        assert_eq!(course.size, 300);
        assert_eq!(course.state, CheckedState::Indeterminate);
        let files_tab = course.tabs.iter().find(|t| t.tab_id == "files").unwrap();
        assert_eq!(files_tab.size, Some(300));
        assert_eq!(files_tab.state, CheckedState::Indeterminate);
        let checked: Vec<i64> = files_tab
            .files
            .iter()
            .filter(|f| f.checked)
            .map(|f| f.file_id)
            .collect();
        assert_eq!(checked, vec![11]);
        let syllabus = course.tabs.iter().find(|t| t.tab_id == "syllabus").unwrap();
        assert_eq!(syllabus.size, None);
    }
}
