//! SQLite-backed settings store.
//!
//! Each course is saved inside its own transaction so a batch commit is
//! atomic per course and never across courses.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::Result;
use crate::external::SyncSettingsStore;
use crate::models::{CourseSyncSetting, CourseSyncSettingsWithFiles, FileSyncSetting};

/// Database repository for sync settings.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ids of every course with a persisted setting.
    pub async fn list_course_ids(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT course_id FROM course_sync_settings ORDER BY course_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("course_id")).collect())
    }

    /// Delete a course setting and its file rows.
    pub async fn delete(&self, course_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM file_sync_settings WHERE course_id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM course_sync_settings WHERE course_id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SyncSettingsStore for SettingsRepository {
    async fn find(&self, course_id: i64) -> Result<Option<CourseSyncSettingsWithFiles>> {
        let row = sqlx::query(
            "SELECT course_id, full_content_sync, full_file_sync, tabs FROM course_sync_settings WHERE course_id = ?",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let files = sqlx::query(
            "SELECT file_id, course_id, display_name, url FROM file_sync_settings WHERE course_id = ? ORDER BY file_id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(CourseSyncSettingsWithFiles {
            settings: course_setting_from_row(&row),
            files: files.iter().map(file_setting_from_row).collect(),
        }))
    }

    async fn save(&self, settings: &CourseSyncSetting, files: &[FileSyncSetting]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tabs_json = serde_json::to_string(&settings.tabs)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO course_sync_settings (course_id, full_content_sync, full_file_sync, tabs, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(course_id) DO UPDATE SET
                   full_content_sync = excluded.full_content_sync,
                   full_file_sync = excluded.full_file_sync,
                   tabs = excluded.tabs,
                   updated_at = excluded.updated_at"#,
        )
        .bind(settings.course_id)
        .bind(settings.full_content_sync as i32)
        .bind(settings.full_file_sync as i32)
        .bind(&tabs_json)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM file_sync_settings WHERE course_id = ?")
            .bind(settings.course_id)
            .execute(&mut *tx)
            .await?;

        for file in files {
            sqlx::query(
                "INSERT INTO file_sync_settings (course_id, file_id, display_name, url) VALUES (?, ?, ?, ?)",
            )
            .bind(settings.course_id)
            .bind(file.id)
            .bind(&file.display_name)
            .bind(&file.url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Saved sync settings for course {} with {} file row(s)",
            settings.course_id,
            files.len()
        );
        Ok(())
    }
}

// Helper functions for row conversion

fn course_setting_from_row(row: &sqlx::sqlite::SqliteRow) -> CourseSyncSetting {
    let full_content_sync: i32 = row.get("full_content_sync");
    let full_file_sync: i32 = row.get("full_file_sync");
    let tabs_str: String = row.get("tabs");
    CourseSyncSetting {
        course_id: row.get("course_id"),
        full_content_sync: full_content_sync != 0,
        tabs: parse_tab_map(&tabs_str),
        full_file_sync: full_file_sync != 0,
    }
}

fn file_setting_from_row(row: &sqlx::sqlite::SqliteRow) -> FileSyncSetting {
    FileSyncSetting {
        id: row.get("file_id"),
        display_name: row.get("display_name"),
        course_id: row.get("course_id"),
        url: row.get("url"),
    }
}

fn parse_tab_map(s: &str) -> BTreeMap<String, bool> {
    serde_json::from_str(s).unwrap_or_default()
}
