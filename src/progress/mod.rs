//! Progress tracking for running sync jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressState {
    Queued,
    InProgress,
    Completed,
    Error,
}

/// Progress of one non-file tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabProgress {
    pub tab_id: String,
    pub state: ProgressState,
}

/// Progress of one file download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileProgress {
    pub file_id: i64,
    pub name: String,
    pub size: u64,
    /// Percent downloaded, 0..=100
    pub progress: u8,
    pub state: ProgressState,
}

impl FileProgress {
    fn downloaded_bytes(&self) -> u64 {
        match self.state {
            ProgressState::Completed => self.size,
            _ => {
                let done = u128::from(self.size) * u128::from(self.progress.min(100)) / 100;
                u64::try_from(done).unwrap_or(u64::MAX)
            }
        }
    }
}

/// Progress of one course within a job, as reported by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: i64,
    pub name: String,
    pub tabs: Vec<TabProgress>,
    pub files: Vec<FileProgress>,
}

/// Progress across every course of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateProgress {
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub state: ProgressState,
    pub updated_at: DateTime<Utc>,
}

impl AggregateProgress {
    /// Aggregate course progress; non-file tabs count `tab_unit_size` bytes each.
    pub fn from_courses(courses: &[CourseProgress], tab_unit_size: u64) -> Self {
        let mut total_bytes = 0u64;
        let mut downloaded_bytes = 0u64;
        let mut any_error = false;
        let mut all_completed = true;

        for course in courses {
            for tab in &course.tabs {
                total_bytes += tab_unit_size;
                if tab.state == ProgressState::Completed {
                    downloaded_bytes += tab_unit_size;
                }
                any_error |= tab.state == ProgressState::Error;
                all_completed &= tab.state == ProgressState::Completed;
            }
            for file in &course.files {
                total_bytes += file.size;
                downloaded_bytes += file.downloaded_bytes();
                any_error |= file.state == ProgressState::Error;
                all_completed &= file.state == ProgressState::Completed;
            }
        }

        let state = if any_error {
            ProgressState::Error
        } else if courses.is_empty() {
            ProgressState::Queued
        } else if all_completed {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        };

        Self {
            total_bytes,
            downloaded_bytes,
            state,
            updated_at: Utc::now(),
        }
    }

    /// Whole percent complete, rounded.
    pub fn percentage(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        ((self.downloaded_bytes as f64 / self.total_bytes as f64) * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.state == ProgressState::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs(state: ProgressState) -> Vec<TabProgress> {
        ["assignments", "pages", "syllabus"]
            .iter()
            .map(|id| TabProgress {
                tab_id: id.to_string(),
                state,
            })
            .collect()
    }

    fn file(id: i64, size: u64, progress: u8, state: ProgressState) -> FileProgress {
        FileProgress {
            file_id: id,
            name: format!("File {}", id),
            size,
            progress,
            state,
        }
    }

    #[test]
    fn test_aggregate_totals_and_percentage() {
        let courses = vec![
            CourseProgress {
                course_id: 1,
                name: "Course 1".to_string(),
                tabs: tabs(ProgressState::Completed),
                files: vec![
                    file(10, 1000, 100, ProgressState::Completed),
                    file(11, 2000, 0, ProgressState::InProgress),
                ],
            },
            CourseProgress {
                course_id: 2,
                name: "Course 2".to_string(),
                tabs: tabs(ProgressState::InProgress),
                files: vec![],
            },
        ];

        let aggregate = AggregateProgress::from_courses(&courses, 1000);

        assert_eq!(aggregate.total_bytes, 6 * 1000 + 3000);
        assert_eq!(aggregate.downloaded_bytes, 3 * 1000 + 1000);
        assert_eq!(aggregate.percentage(), 44);
        assert_eq!(aggregate.state, ProgressState::InProgress);
    }

    #[test]
    fn test_partial_file_progress_counts() {
        let courses = vec![CourseProgress {
            course_id: 1,
            name: "Course 1".to_string(),
            tabs: vec![],
            files: vec![file(10, 1000, 50, ProgressState::InProgress)],
        }];

        let aggregate = AggregateProgress::from_courses(&courses, 1000);
        assert_eq!(aggregate.downloaded_bytes, 500);
        assert_eq!(aggregate.percentage(), 50);
    }

    #[test]
    fn test_partial_progress_of_huge_file_does_not_overflow() {
        let huge = file(10, u64::MAX, 50, ProgressState::InProgress);
        assert_eq!(huge.downloaded_bytes(), u64::MAX / 2);

        let done = file(11, u64::MAX, 100, ProgressState::InProgress);
        assert_eq!(done.downloaded_bytes(), u64::MAX);
    }

    #[test]
    fn test_aggregate_state_precedence() {
        let completed = vec![CourseProgress {
            course_id: 1,
            name: "Course 1".to_string(),
            tabs: tabs(ProgressState::Completed),
            files: vec![file(10, 1000, 100, ProgressState::Completed)],
        }];
        let aggregate = AggregateProgress::from_courses(&completed, 1000);
        assert!(aggregate.is_complete());
        assert_eq!(aggregate.percentage(), 100);

        let mut failed = completed.clone();
        failed[0].files[0].state = ProgressState::Error;
        assert_eq!(
            AggregateProgress::from_courses(&failed, 1000).state,
            ProgressState::Error
        );

        let empty = AggregateProgress::from_courses(&[], 1000);
        assert_eq!(empty.state, ProgressState::Queued);
        assert_eq!(empty.percentage(), 0);
    }
}
