//! Error handling module for the offline sync engine.
//!
//! Provides a single error type with stable error codes so the presentation
//! layer can map failures to user-facing notices.

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const CATALOG_FETCH_ERROR: &str = "CATALOG_FETCH_ERROR";
    pub const PERSISTENCE_ERROR: &str = "PERSISTENCE_ERROR";
    pub const SYNC_SUBMISSION_ERROR: &str = "SYNC_SUBMISSION_ERROR";
    pub const PROGRESS_POLL_FAILURE: &str = "PROGRESS_POLL_FAILURE";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const CANCELLED: &str = "CANCELLED";
}

/// Engine error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network/API failure while loading courses, tabs or files
    CatalogFetch(String),
    /// Settings commit failed for one or more courses
    Persistence {
        message: String,
        failed_courses: Vec<i64>,
    },
    /// The scheduler rejected the sync job
    SyncSubmission(String),
    /// Polling could not determine job completion
    ProgressPoll(String),
    /// Settings store error
    Database(String),
    /// Unknown course, tab or file
    NotFound(String),
    /// Operation not allowed in the current phase
    InvalidState(String),
    /// Superseded by a newer request or session teardown
    Cancelled,
}

impl SyncError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::CatalogFetch(_) => codes::CATALOG_FETCH_ERROR,
            SyncError::Persistence { .. } => codes::PERSISTENCE_ERROR,
            SyncError::SyncSubmission(_) => codes::SYNC_SUBMISSION_ERROR,
            SyncError::ProgressPoll(_) => codes::PROGRESS_POLL_FAILURE,
            SyncError::Database(_) => codes::DATABASE_ERROR,
            SyncError::NotFound(_) => codes::NOT_FOUND,
            SyncError::InvalidState(_) => codes::INVALID_STATE,
            SyncError::Cancelled => codes::CANCELLED,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            SyncError::CatalogFetch(msg) => msg.clone(),
            SyncError::Persistence { message, .. } => message.clone(),
            SyncError::SyncSubmission(msg) => msg.clone(),
            SyncError::ProgressPoll(msg) => msg.clone(),
            SyncError::Database(msg) => msg.clone(),
            SyncError::NotFound(msg) => msg.clone(),
            SyncError::InvalidState(msg) => msg.clone(),
            SyncError::Cancelled => "Operation cancelled".to_string(),
        }
    }

    /// Whether retrying or refreshing can clear this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::NotFound(_) | SyncError::InvalidState(_))
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for SyncError {}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        SyncError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        SyncError::Database(format!("JSON error: {}", err))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;
