use chrono::Utc;
use tracing::debug;

use crate::db::repositories::dashboard_repository::DashboardRepository;
use crate::db::repositories::parse_datetime;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::dashboard::{DashboardOverview, RecentTask, TopEmployee};
use crate::models::session::Principal;
use crate::models::task::{TaskPriority, TaskStatus};

/// Aggregate workforce snapshot for the admin dashboard.
pub struct DashboardService {
    db: DbPool,
}

impl DashboardService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn overview(&self, principal: &Principal) -> AppResult<DashboardOverview> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let organization_id = principal.organization_id.as_str();
        let now = Utc::now().to_rfc3339();

        let employees = DashboardRepository::employee_counts(&conn, organization_id)?;
        let tasks = DashboardRepository::task_counts(&conn, organization_id, &now)?;

        let top_employees = DashboardRepository::top_employees(&conn, organization_id)?
            .into_iter()
            .map(|row| TopEmployee {
                id: row.id,
                name: row.name,
                role: row.role,
                department: row.department,
                total_tasks: row.total_tasks,
                completed_tasks: row.completed_tasks,
                completion_percent: row.completion_percent,
            })
            .collect();

        let recent_tasks = DashboardRepository::recent_tasks(&conn, organization_id)?
            .into_iter()
            .map(|row| {
                Ok(RecentTask {
                    status: TaskStatus::parse(&row.status)?,
                    priority: TaskPriority::parse(&row.priority)?,
                    created_at: parse_datetime(&row.created_at)?,
                    id: row.id,
                    title: row.title,
                    employee_name: row.employee_name,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let departments = DashboardRepository::department_breakdown(&conn, organization_id)?;

        debug!(
            target: "app::dashboard",
            organization_id = %organization_id,
            employees = employees.total,
            tasks = tasks.total,
            "dashboard overview computed"
        );

        Ok(DashboardOverview {
            employees,
            tasks,
            top_employees,
            recent_tasks,
            departments,
        })
    }
}
