//! Storage accounting for pending selection changes.
//!
//! Non-file tabs have no known payload size ahead of time and are counted as
//! a flat `tab_unit_size` each.

use std::sync::Arc;

use crate::external::{LocalFileIndex, StorageProbe};
use crate::models::{format_short_file_size, LocalAvailability, RemoteFile, StorageInfo};
use crate::selection::{CourseSelection, SelectionSnapshot, SelectionTree};

#[derive(Clone)]
pub struct StorageAccountant {
    probe: Arc<dyn StorageProbe>,
    local_index: Arc<dyn LocalFileIndex>,
    tab_unit_size: u64,
}

impl StorageAccountant {
    pub fn new(
        probe: Arc<dyn StorageProbe>,
        local_index: Arc<dyn LocalFileIndex>,
        tab_unit_size: u64,
    ) -> Self {
        Self {
            probe,
            local_index,
            tab_unit_size,
        }
    }

    pub fn tab_unit_size(&self) -> u64 {
        self.tab_unit_size
    }

    /// Storage bar figures including uncommitted selection changes.
    pub fn storage_info(&self, tree: &SelectionTree, original: &SelectionSnapshot) -> StorageInfo {
        let total = self.probe.total_space();
        let free = self.probe.free_space().min(total);
        let app_size = self.probe.app_size();
        let delta = self.pending_delta(tree, original);

        let used = total - free;
        let other_apps = used.saturating_sub(app_size);
        let app_effective = add_signed(app_size, delta);
        let used_effective = add_signed(used, delta).min(total);

        let (other_apps_percent, this_app_percent) = if total > 0 {
            let other = percent_of(other_apps, total);
            let app = percent_of(app_effective, total).max(1);
            (other, (app + other).min(100))
        } else {
            (0, 0)
        };

        StorageInfo {
            other_apps_percent: other_apps_percent as u8,
            this_app_percent: this_app_percent as u8,
            human_readable_used_of_total: format!(
                "Used {} of {}",
                format_short_file_size(used_effective),
                format_short_file_size(total)
            ),
        }
    }

    /// Signed byte change if the working selection were committed now.
    pub fn pending_delta(&self, tree: &SelectionTree, original: &SelectionSnapshot) -> i64 {
        let mut delta: i64 = 0;

        for entry in tree.entries() {
            let course_id = entry.course.id;
            let Some(working) = tree.selection(course_id) else {
                continue;
            };
            let empty = CourseSelection::empty(course_id);
            let baseline = original.get(course_id).unwrap_or(&empty);

            for tab in entry.tabs.iter().filter(|tab| !tab.kind.is_files()) {
                let was = baseline.settings.is_tab_selected(tab.kind);
                let now = working.settings.is_tab_selected(tab.kind);
                match (was, now) {
                    (false, true) => delta += self.tab_unit_size as i64,
                    (true, false) => delta -= self.tab_unit_size as i64,
                    _ => {}
                }
            }

            for file in &entry.files {
                let was = baseline.selected_files.contains(&file.id);
                let now = working.selected_files.contains(&file.id);
                match (was, now) {
                    (false, true) => delta += file.size as i64,
                    (true, false) => delta -= self.actual_local_size(file) as i64,
                    _ => {}
                }
            }
        }

        delta
    }

    /// Bytes a sync triggered now would download.
    pub fn projected_sync_size(&self, tree: &SelectionTree) -> u64 {
        tree.entries()
            .filter_map(|entry| Some((entry, tree.selection(entry.course.id)?)))
            .map(|(entry, selection)| {
                let tabs = entry
                    .tabs
                    .iter()
                    .filter(|tab| !tab.kind.is_files() && selection.settings.is_tab_selected(tab.kind))
                    .count() as u64;
                let files: u64 = entry
                    .files
                    .iter()
                    .filter(|file| selection.selected_files.contains(&file.id))
                    .map(|file| file.size)
                    .sum();
                tabs * self.tab_unit_size + files
            })
            .sum()
    }

    /// Bytes a file currently occupies on the device.
    pub fn actual_local_size(&self, file: &RemoteFile) -> u64 {
        match self.availability(file) {
            LocalAvailability::Downloaded => file.size,
            LocalAvailability::Partial(bytes) => bytes,
            LocalAvailability::NotDownloaded => 0,
        }
    }

    pub fn availability(&self, file: &RemoteFile) -> LocalAvailability {
        if self.local_index.is_fully_downloaded(file.id) {
            return LocalAvailability::Downloaded;
        }
        match self.local_index.partial_bytes(file.id) {
            0 => LocalAvailability::NotDownloaded,
            bytes => LocalAvailability::Partial(bytes.min(file.size)),
        }
    }
}

fn add_signed(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn percent_of(part: u64, total: u64) -> u64 {
    (part as u128 * 100 / total as u128) as u64
}
