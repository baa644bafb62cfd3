//! Catalog and baseline fetching for loads and silent refreshes.

use futures::future::try_join_all;

use super::Collaborators;
use crate::errors::Result;
use crate::models::Course;
use crate::selection::LoadedCourse;

/// Fetch every eligible course in scope together with its tabs, files and
/// persisted settings. The first failure aborts the whole fetch.
pub(super) async fn fetch_catalog(
    collaborators: &Collaborators,
    scope: Option<i64>,
) -> Result<Vec<LoadedCourse>> {
    let courses = collaborators.catalog.list_courses(scope).await?;

    let eligible: Vec<Course> = courses
        .into_iter()
        .filter(|course| scope.map_or(true, |id| course.id == id))
        .filter(|course| {
            let eligible = course.flags.is_eligible();
            if !eligible {
                tracing::debug!("Skipping ineligible course {}", course.id);
            }
            eligible
        })
        .collect();

    fetch_courses(collaborators, eligible).await
}

/// Fetch contents of the given courses concurrently, preserving order.
pub(super) async fn fetch_courses(
    collaborators: &Collaborators,
    courses: Vec<Course>,
) -> Result<Vec<LoadedCourse>> {
    try_join_all(
        courses
            .into_iter()
            .map(|course| fetch_course(collaborators, course)),
    )
    .await
}

async fn fetch_course(collaborators: &Collaborators, course: Course) -> Result<LoadedCourse> {
    let tabs = collaborators.catalog.list_tabs(course.id).await?;
    let has_files_tab = tabs
        .iter()
        .any(|tab| tab.kind().is_some_and(|kind| kind.is_files()));

    let settings = collaborators.store.find(course.id);
    let (files, settings) = if has_files_tab {
        futures::try_join!(collaborators.catalog.list_files(course.id), settings)?
    } else {
        (Vec::new(), settings.await?)
    };

    tracing::debug!(
        "Fetched course {} with {} tab(s) and {} file(s)",
        course.id,
        tabs.len(),
        files.len()
    );

    Ok(LoadedCourse {
        course,
        tabs,
        files,
        settings,
    })
}
