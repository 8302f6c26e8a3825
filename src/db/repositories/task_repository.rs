use rusqlite::types::Value as SqlValue;
use rusqlite::{named_params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::repositories::{deserialize_labels, parse_datetime, parse_datetime_opt, serialize_labels};
use crate::error::AppResult;
use crate::models::session::TaskScope;
use crate::models::task::{TaskFilter, TaskPriority, TaskRecord, TaskStatus, TaskWithAssignee};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        organization_id,
        employee_id,
        title,
        description,
        required_skills,
        priority,
        status,
        due_at,
        completed_at,
        proof_ref,
        created_at
    FROM tasks
"#;

const JOINED_SELECT: &str = r#"
    SELECT
        t.id,
        t.organization_id,
        t.employee_id,
        t.title,
        t.description,
        t.required_skills,
        t.priority,
        t.status,
        t.due_at,
        t.completed_at,
        t.proof_ref,
        t.created_at,
        e.name AS employee_name,
        e.role AS employee_role
    FROM tasks t
    LEFT JOIN employees e ON t.employee_id = e.id
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub organization_id: String,
    pub employee_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub required_skills: String,
    pub priority: String,
    pub status: String,
    pub due_at: Option<String>,
    pub completed_at: Option<String>,
    pub proof_ref: Option<String>,
    pub created_at: String,
}

impl TaskRow {
    pub fn from_record(record: &TaskRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            organization_id: record.organization_id.clone(),
            employee_id: record.employee_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            required_skills: serialize_labels(&record.required_skills)?,
            priority: record.priority.as_str().to_string(),
            status: record.status.as_str().to_string(),
            due_at: record.due_at.map(|dt| dt.to_rfc3339()),
            completed_at: record.completed_at.map(|dt| dt.to_rfc3339()),
            proof_ref: record.proof_ref.clone(),
            created_at: record.created_at.to_rfc3339(),
        })
    }

    pub fn into_record(self) -> AppResult<TaskRecord> {
        Ok(TaskRecord {
            required_skills: deserialize_labels(&self.required_skills)?,
            priority: TaskPriority::parse(&self.priority)?,
            status: TaskStatus::parse(&self.status)?,
            due_at: parse_datetime_opt(self.due_at)?,
            completed_at: parse_datetime_opt(self.completed_at)?,
            created_at: parse_datetime(&self.created_at)?,
            id: self.id,
            organization_id: self.organization_id,
            employee_id: self.employee_id,
            title: self.title,
            description: self.description,
            proof_ref: self.proof_ref,
        })
    }
}

pub struct TaskRepository;

impl TaskRepository {
    pub fn insert(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO tasks (
                id, organization_id, employee_id, title, description,
                required_skills, priority, status, due_at, completed_at,
                proof_ref, created_at
            )
            VALUES (
                :id, :organization_id, :employee_id, :title, :description,
                :required_skills, :priority, :status, :due_at, :completed_at,
                :proof_ref, :created_at
            )
            "#,
            named_params! {
                ":id": row.id,
                ":organization_id": row.organization_id,
                ":employee_id": row.employee_id,
                ":title": row.title,
                ":description": row.description,
                ":required_skills": row.required_skills,
                ":priority": row.priority,
                ":status": row.status,
                ":due_at": row.due_at,
                ":completed_at": row.completed_at,
                ":proof_ref": row.proof_ref,
                ":created_at": row.created_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
            UPDATE tasks SET
                employee_id = :employee_id,
                title = :title,
                description = :description,
                required_skills = :required_skills,
                priority = :priority,
                status = :status,
                due_at = :due_at,
                completed_at = :completed_at,
                proof_ref = :proof_ref
            WHERE id = :id AND organization_id = :organization_id
            "#,
            named_params! {
                ":id": row.id,
                ":organization_id": row.organization_id,
                ":employee_id": row.employee_id,
                ":title": row.title,
                ":description": row.description,
                ":required_skills": row.required_skills,
                ":priority": row.priority,
                ":status": row.status,
                ":due_at": row.due_at,
                ":completed_at": row.completed_at,
                ":proof_ref": row.proof_ref,
            },
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, organization_id: &str, id: &str) -> AppResult<bool> {
        let affected = conn.execute(
            "DELETE FROM tasks WHERE id = :id AND organization_id = :organization_id",
            named_params! { ":id": id, ":organization_id": organization_id },
        )?;
        Ok(affected > 0)
    }

    /// Scoped single-row lookup. An employee scope cannot reach tasks
    /// assigned to anyone else, whatever id it asks for.
    pub fn find_by_id(
        conn: &Connection,
        scope: &TaskScope,
        id: &str,
    ) -> AppResult<Option<TaskRow>> {
        let mut sql =
            format!("{BASE_SELECT} WHERE id = ?1 AND organization_id = ?2");
        let mut values: Vec<SqlValue> = vec![
            SqlValue::from(id.to_string()),
            SqlValue::from(scope.organization_id.clone()),
        ];
        if let Some(employee_id) = &scope.employee_id {
            sql.push_str(" AND employee_id = ?3");
            values.push(SqlValue::from(employee_id.clone()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(params_from_iter(values.iter()), map_row)
            .optional()?;
        Ok(row)
    }

    pub fn find_with_assignee(
        conn: &Connection,
        scope: &TaskScope,
        id: &str,
    ) -> AppResult<Option<(TaskRow, Option<String>, Option<String>)>> {
        let mut sql =
            format!("{JOINED_SELECT} WHERE t.id = ?1 AND t.organization_id = ?2");
        let mut values: Vec<SqlValue> = vec![
            SqlValue::from(id.to_string()),
            SqlValue::from(scope.organization_id.clone()),
        ];
        if let Some(employee_id) = &scope.employee_id {
            sql.push_str(" AND t.employee_id = ?3");
            values.push(SqlValue::from(employee_id.clone()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(params_from_iter(values.iter()), map_joined_row)
            .optional()?;
        Ok(row)
    }

    /// Scoped listing with optional status/assignee filters, newest first.
    /// The WHERE clause grows with the filters, same shape as the scoped
    /// lookup above.
    pub fn list(
        conn: &Connection,
        scope: &TaskScope,
        filter: &TaskFilter,
    ) -> AppResult<Vec<(TaskRow, Option<String>, Option<String>)>> {
        let mut sql = format!("{JOINED_SELECT} WHERE t.organization_id = ?1");
        let mut values: Vec<SqlValue> = vec![SqlValue::from(scope.organization_id.clone())];

        if let Some(employee_id) = &scope.employee_id {
            values.push(SqlValue::from(employee_id.clone()));
            sql.push_str(&format!(" AND t.employee_id = ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(SqlValue::from(status.as_str().to_string()));
            sql.push_str(&format!(" AND t.status = ?{}", values.len()));
        }
        if let Some(employee_id) = &filter.employee_id {
            values.push(SqlValue::from(employee_id.clone()));
            sql.push_str(&format!(" AND t.employee_id = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY t.created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), map_joined_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every task of the organization, for the scoring and recommendation
    /// engines.
    pub fn list_by_organization(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<TaskRow>> {
        let sql = format!("{BASE_SELECT} WHERE organization_id = :organization_id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

pub fn joined_into_record(
    joined: (TaskRow, Option<String>, Option<String>),
) -> AppResult<TaskWithAssignee> {
    let (row, employee_name, employee_role) = joined;
    Ok(TaskWithAssignee {
        task: row.into_record()?,
        employee_name,
        employee_role,
    })
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get("id")?,
        organization_id: row.get("organization_id")?,
        employee_id: row.get("employee_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        required_skills: row.get("required_skills")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        due_at: row.get("due_at")?,
        completed_at: row.get("completed_at")?,
        proof_ref: row.get("proof_ref")?,
        created_at: row.get("created_at")?,
    })
}

fn map_joined_row(
    row: &Row<'_>,
) -> rusqlite::Result<(TaskRow, Option<String>, Option<String>)> {
    Ok((
        map_row(row)?,
        row.get("employee_name")?,
        row.get("employee_role")?,
    ))
}
