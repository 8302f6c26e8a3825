use rusqlite::{named_params, Connection};

use crate::error::AppResult;
use crate::models::dashboard::{DepartmentCount, EmployeeCounts, TaskCounts};

/// Raw recent-task row; status/priority are parsed by the service.
#[derive(Debug, Clone)]
pub struct RecentTaskRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub created_at: String,
    pub employee_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TopEmployeeRow {
    pub id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_percent: i64,
}

pub struct DashboardRepository;

impl DashboardRepository {
    pub fn employee_counts(conn: &Connection, organization_id: &str) -> AppResult<EmployeeCounts> {
        let counts = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_active = 0 THEN 1 ELSE 0 END), 0)
            FROM employees
            WHERE organization_id = :organization_id
            "#,
            named_params! { ":organization_id": organization_id },
            |row| {
                Ok(EmployeeCounts {
                    total: row.get(0)?,
                    active: row.get(1)?,
                    inactive: row.get(2)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// Timestamps are RFC 3339 UTC strings, so the overdue comparison can
    /// stay lexicographic.
    pub fn task_counts(
        conn: &Connection,
        organization_id: &str,
        now: &str,
    ) -> AppResult<TaskCounts> {
        let counts = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'Assigned' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'In Progress' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'Completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN due_at IS NOT NULL
                                   AND due_at < :now
                                   AND status != 'Completed' THEN 1 ELSE 0 END), 0)
            FROM tasks
            WHERE organization_id = :organization_id
            "#,
            named_params! { ":organization_id": organization_id, ":now": now },
            |row| {
                Ok(TaskCounts {
                    total: row.get(0)?,
                    assigned: row.get(1)?,
                    in_progress: row.get(2)?,
                    completed: row.get(3)?,
                    overdue: row.get(4)?,
                })
            },
        )?;
        Ok(counts)
    }

    pub fn top_employees(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<TopEmployeeRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                e.id,
                e.name,
                e.role,
                e.department,
                COUNT(t.id) AS total_tasks,
                COALESCE(SUM(CASE WHEN t.status = 'Completed' THEN 1 ELSE 0 END), 0)
                    AS completed_tasks,
                CASE WHEN COUNT(t.id) = 0 THEN 0
                     ELSE CAST(ROUND(
                         SUM(CASE WHEN t.status = 'Completed' THEN 1 ELSE 0 END) * 100.0
                         / COUNT(t.id)) AS INTEGER)
                END AS completion_percent
            FROM employees e
            LEFT JOIN tasks t
                ON t.employee_id = e.id AND t.organization_id = :organization_id
            WHERE e.organization_id = :organization_id AND e.is_active = 1
            GROUP BY e.id, e.name, e.role, e.department
            ORDER BY completion_percent DESC, completed_tasks DESC
            LIMIT 5
            "#,
        )?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, |row| {
                Ok(TopEmployeeRow {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    role: row.get("role")?,
                    department: row.get("department")?,
                    total_tasks: row.get("total_tasks")?,
                    completed_tasks: row.get("completed_tasks")?,
                    completion_percent: row.get("completion_percent")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn recent_tasks(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<RecentTaskRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.title, t.status, t.priority, t.created_at,
                   e.name AS employee_name
            FROM tasks t
            LEFT JOIN employees e ON t.employee_id = e.id
            WHERE t.organization_id = :organization_id
            ORDER BY t.created_at DESC
            LIMIT 5
            "#,
        )?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, |row| {
                Ok(RecentTaskRow {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    status: row.get("status")?,
                    priority: row.get("priority")?,
                    created_at: row.get("created_at")?,
                    employee_name: row.get("employee_name")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn department_breakdown(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<DepartmentCount>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT department, COUNT(*) AS count
            FROM employees
            WHERE organization_id = :organization_id AND is_active = 1
            GROUP BY department
            ORDER BY count DESC
            "#,
        )?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, |row| {
                Ok(DepartmentCount {
                    department: row.get("department")?,
                    count: row.get("count")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
