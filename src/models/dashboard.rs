use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::{TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub total: i64,
    pub assigned: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
}

/// Top-performer row ranked by completion rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopEmployee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub employee_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

/// Aggregate workforce snapshot for one organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub employees: EmployeeCounts,
    pub tasks: TaskCounts,
    pub top_employees: Vec<TopEmployee>,
    pub recent_tasks: Vec<RecentTask>,
    pub departments: Vec<DepartmentCount>,
}
