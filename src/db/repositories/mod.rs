use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

pub mod dashboard_repository;
pub mod employee_repository;
pub mod organization_repository;
pub mod session_repository;
pub mod task_repository;

/// Timestamps live as RFC 3339 TEXT columns; rows are parsed into typed
/// records exactly once, here at the boundary.
pub(crate) fn parse_datetime(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| AppError::database(format!("corrupt timestamp {value:?}: {err}")))
}

pub(crate) fn parse_datetime_opt(value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_datetime).transpose()
}

/// Skill label lists are stored as JSON arrays in TEXT columns.
pub(crate) fn serialize_labels(labels: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(labels)?)
}

pub(crate) fn deserialize_labels(value: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|err| AppError::database(format!("corrupt label list {value:?}: {err}")))
}
