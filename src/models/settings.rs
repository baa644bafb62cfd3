//! Persisted sync settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TabKind;

/// Per-course sync flags.
///
/// `full_content_sync` and `full_file_sync` are derived from the tab map and
/// the selected files; they are stored only so the download worker can skip
/// enumerating every leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSyncSetting {
    pub course_id: i64,
    pub full_content_sync: bool,
    #[serde(default)]
    pub tabs: BTreeMap<String, bool>,
    pub full_file_sync: bool,
}

impl CourseSyncSetting {
    /// A setting with nothing selected.
    pub fn empty(course_id: i64) -> Self {
        Self {
            course_id,
            full_content_sync: false,
            tabs: BTreeMap::new(),
            full_file_sync: false,
        }
    }

    pub fn is_tab_selected(&self, tab: TabKind) -> bool {
        self.tabs.get(tab.as_str()).copied().unwrap_or(false)
    }

    pub fn set_tab(&mut self, tab: TabKind, selected: bool) {
        self.tabs.insert(tab.as_str().to_string(), selected);
    }
}

/// A single file selected for offline use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileSyncSetting {
    pub id: i64,
    pub display_name: String,
    pub course_id: i64,
    pub url: String,
}

/// A course setting together with its per-file rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSyncSettingsWithFiles {
    pub settings: CourseSyncSetting,
    #[serde(default)]
    pub files: Vec<FileSyncSetting>,
}
