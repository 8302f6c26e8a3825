use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Strict three-state task lifecycle. Back-transitions are allowed; the
/// service layer keeps `completed_at` in lockstep with `Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Assigned => "Assigned",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "Assigned" => Ok(TaskStatus::Assigned),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(AppError::validation(format!(
                "status must be Assigned, In Progress or Completed (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "Low" => Ok(TaskPriority::Low),
            "Medium" => Ok(TaskPriority::Medium),
            "High" => Ok(TaskPriority::High),
            other => Err(AppError::validation(format!(
                "priority must be Low, Medium or High (got {other:?})"
            ))),
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub organization_id: String,
    /// Nullable assignment; deleting an employee detaches their tasks.
    pub employee_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_at: Option<DateTime<Utc>>,
    /// Set exactly when `status == Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Opaque completion proof (e.g. an on-chain transaction hash). Not
    /// interpreted anywhere in the core.
    pub proof_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Task row joined with its assignee's display fields for listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithAssignee {
    pub task: TaskRecord,
    pub employee_name: Option<String>,
    pub employee_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub employee_id: Option<Option<String>>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_at: Option<Option<DateTime<Utc>>>,
}

/// Status mutation payload, usable by admins and by the assigned employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdate {
    pub status: TaskStatus,
    #[serde(default)]
    pub proof_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Admin-only filter; employee scopes already pin the assignee.
    pub employee_id: Option<String>,
}
