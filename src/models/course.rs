//! Catalog models: courses, content tabs and files.

use serde::{Deserialize, Serialize};

/// Content tab kinds eligible for offline sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    Assignments,
    Pages,
    Grades,
    Syllabus,
    Quizzes,
    Discussions,
    Announcements,
    People,
    Conferences,
    Files,
}

impl TabKind {
    pub const ALL: [TabKind; 10] = [
        TabKind::Assignments,
        TabKind::Pages,
        TabKind::Grades,
        TabKind::Syllabus,
        TabKind::Quizzes,
        TabKind::Discussions,
        TabKind::Announcements,
        TabKind::People,
        TabKind::Conferences,
        TabKind::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TabKind::Assignments => "assignments",
            TabKind::Pages => "pages",
            TabKind::Grades => "grades",
            TabKind::Syllabus => "syllabus",
            TabKind::Quizzes => "quizzes",
            TabKind::Discussions => "discussions",
            TabKind::Announcements => "announcements",
            TabKind::People => "people",
            TabKind::Conferences => "conferences",
            TabKind::Files => "files",
        }
    }

    /// Resolve a remote tab id against the allow-list.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == id)
    }

    pub fn is_files(&self) -> bool {
        matches!(self, TabKind::Files)
    }
}

/// A navigation tab of a course as reported by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentTab {
    pub tab_id: String,
    pub label: String,
}

impl ContentTab {
    pub fn new(tab_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            tab_id: tab_id.into(),
            label: label.into(),
        }
    }

    /// The allow-listed kind of this tab, if any.
    pub fn kind(&self) -> Option<TabKind> {
        TabKind::from_id(&self.tab_id)
    }
}

/// Enrollment and term validity of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseFlags {
    pub active_enrollment: bool,
    pub term_concluded: bool,
    pub access_restricted_by_date: bool,
}

impl Default for CourseFlags {
    fn default() -> Self {
        Self {
            active_enrollment: true,
            term_concluded: false,
            access_restricted_by_date: false,
        }
    }
}

impl CourseFlags {
    pub fn is_eligible(&self) -> bool {
        self.active_enrollment && !self.term_concluded && !self.access_restricted_by_date
    }
}

/// A course in the remote catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tabs: Vec<ContentTab>,
    #[serde(default)]
    pub flags: CourseFlags,
}

impl Course {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tabs: Vec::new(),
            flags: CourseFlags::default(),
        }
    }
}

/// A downloadable file under a course's Files tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: i64,
    pub course_id: i64,
    pub display_name: String,
    pub size: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_kind_allow_list() {
        assert_eq!(TabKind::from_id("files"), Some(TabKind::Files));
        assert_eq!(TabKind::from_id("syllabus"), Some(TabKind::Syllabus));
        assert_eq!(TabKind::from_id("collaborations"), None);
        assert!(TabKind::Files.is_files());
        assert!(!TabKind::Pages.is_files());
    }

    #[test]
    fn test_course_flags_eligibility() {
        let mut course = Course::new(1, "Biology");
        assert!(course.flags.is_eligible());
        course.flags.term_concluded = true;
        assert!(!course.flags.is_eligible());
    }
}
