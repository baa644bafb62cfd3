//! Read-only views of the selection tree handed to the presentation layer.

use serde::{Deserialize, Serialize};

/// Tri-state checkbox value derived from children.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckedState {
    Checked,
    Indeterminate,
    Unchecked,
}

impl CheckedState {
    pub fn from_bool(checked: bool) -> Self {
        if checked {
            CheckedState::Checked
        } else {
            CheckedState::Unchecked
        }
    }

    /// Fold child states into the parent state.
    pub fn aggregate<I: IntoIterator<Item = CheckedState>>(children: I) -> Self {
        let mut any_checked = false;
        let mut any_unchecked = false;
        for state in children {
            match state {
                CheckedState::Checked => any_checked = true,
                CheckedState::Unchecked => any_unchecked = true,
                CheckedState::Indeterminate => return CheckedState::Indeterminate,
            }
        }
        match (any_checked, any_unchecked) {
            (true, false) => CheckedState::Checked,
            (true, true) => CheckedState::Indeterminate,
            _ => CheckedState::Unchecked,
        }
    }
}

/// Whether a file is already on the device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "bytes", rename_all = "camelCase")]
pub enum LocalAvailability {
    Downloaded,
    Partial(u64),
    NotDownloaded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub file_id: i64,
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub checked: bool,
    pub local: LocalAvailability,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabNode {
    pub tab_id: String,
    pub label: String,
    pub state: CheckedState,
    /// Only the Files tab reports a size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub files: Vec<FileNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseNode {
    pub course_id: i64,
    pub name: String,
    pub state: CheckedState,
    pub full_content_sync: bool,
    pub size: u64,
    pub size_label: String,
    pub tabs: Vec<TabNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_states() {
        use CheckedState::*;
        assert_eq!(CheckedState::aggregate([Checked, Checked]), Checked);
        assert_eq!(CheckedState::aggregate([Unchecked, Unchecked]), Unchecked);
        assert_eq!(CheckedState::aggregate([Checked, Unchecked]), Indeterminate);
        assert_eq!(CheckedState::aggregate([Checked, Indeterminate]), Indeterminate);
        assert_eq!(CheckedState::aggregate([]), Unchecked);
    }
}
