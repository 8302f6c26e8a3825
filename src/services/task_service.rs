use chrono::Utc;
use tracing::info;

use crate::db::repositories::employee_repository::EmployeeRepository;
use crate::db::repositories::task_repository::{joined_into_record, TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::session::Principal;
use crate::models::task::{
    TaskCreateInput, TaskFilter, TaskRecord, TaskStatus, TaskStatusUpdate, TaskUpdateInput,
    TaskWithAssignee,
};

#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
}

impl TaskService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_task(
        &self,
        principal: &Principal,
        input: TaskCreateInput,
    ) -> AppResult<TaskRecord> {
        principal.require_admin()?;

        let title = normalize_title(&input.title)?;
        let conn = self.db.get_connection()?;

        if let Some(employee_id) = &input.employee_id {
            let known =
                EmployeeRepository::find_by_id(&conn, &principal.organization_id, employee_id)?;
            if known.is_none() {
                return Err(AppError::validation(
                    "assignee not found in your organization",
                ));
            }
        }

        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: principal.organization_id.clone(),
            employee_id: input.employee_id,
            title,
            description: normalize_optional(input.description),
            required_skills: input.required_skills.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            status: TaskStatus::Assigned,
            due_at: input.due_at,
            completed_at: None,
            proof_ref: None,
            created_at: Utc::now(),
        };

        TaskRepository::insert(&conn, &TaskRow::from_record(&record)?)?;
        info!(target: "app::tasks", task_id = %record.id, "task created");
        Ok(record)
    }

    /// Admin metadata edit. Status changes go through `set_status` so the
    /// completed_at invariant has a single owner.
    pub fn update_task(
        &self,
        principal: &Principal,
        id: &str,
        update: TaskUpdateInput,
    ) -> AppResult<TaskRecord> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let scope = principal.task_scope();
        let mut record = TaskRepository::find_by_id(&conn, &scope, id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        if let Some(title) = update.title {
            record.title = normalize_title(&title)?;
        }
        if let Some(description) = update.description {
            record.description = normalize_optional(description);
        }
        if let Some(employee_id) = update.employee_id {
            if let Some(assignee) = &employee_id {
                let known =
                    EmployeeRepository::find_by_id(&conn, &principal.organization_id, assignee)?;
                if known.is_none() {
                    return Err(AppError::validation(
                        "assignee not found in your organization",
                    ));
                }
            }
            record.employee_id = employee_id;
        }
        if let Some(required_skills) = update.required_skills {
            record.required_skills = required_skills;
        }
        if let Some(priority) = update.priority {
            record.priority = priority;
        }
        if let Some(due_at) = update.due_at {
            record.due_at = due_at;
        }

        TaskRepository::update(&conn, &TaskRow::from_record(&record)?)?;
        info!(target: "app::tasks", task_id = %record.id, "task updated");
        Ok(record)
    }

    /// Status mutation, open to admins and to the assigned employee. The
    /// scoped lookup means an employee cannot reach anyone else's task, so
    /// no separate ownership check is needed.
    pub fn set_status(
        &self,
        principal: &Principal,
        id: &str,
        update: TaskStatusUpdate,
    ) -> AppResult<TaskRecord> {
        let conn = self.db.get_connection()?;
        let scope = principal.task_scope();
        let mut record = TaskRepository::find_by_id(&conn, &scope, id)?
            .ok_or_else(AppError::not_found)?
            .into_record()?;

        record.status = update.status;
        record.completed_at = match update.status {
            TaskStatus::Completed => Some(Utc::now()),
            _ => None,
        };
        record.proof_ref = update.proof_ref;

        TaskRepository::update(&conn, &TaskRow::from_record(&record)?)?;
        info!(
            target: "app::tasks",
            task_id = %record.id,
            status = record.status.as_str(),
            "task status changed"
        );
        Ok(record)
    }

    pub fn delete_task(&self, principal: &Principal, id: &str) -> AppResult<()> {
        principal.require_admin()?;

        let deleted = self.db.with_connection(|conn| {
            TaskRepository::delete(conn, &principal.organization_id, id)
        })?;
        if !deleted {
            return Err(AppError::not_found());
        }
        info!(target: "app::tasks", task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, principal: &Principal, id: &str) -> AppResult<TaskWithAssignee> {
        let conn = self.db.get_connection()?;
        let scope = principal.task_scope();
        let joined = TaskRepository::find_with_assignee(&conn, &scope, id)?
            .ok_or_else(AppError::not_found)?;
        joined_into_record(joined)
    }

    /// Scoped listing. The assignee filter is an admin affordance; employee
    /// scopes already pin the assignee, so it is ignored for them.
    pub fn list_tasks(
        &self,
        principal: &Principal,
        filter: TaskFilter,
    ) -> AppResult<Vec<TaskWithAssignee>> {
        let conn = self.db.get_connection()?;
        let scope = principal.task_scope();

        let mut filter = filter;
        if !principal.is_admin() {
            filter.employee_id = None;
        }

        TaskRepository::list(&conn, &scope, &filter)?
            .into_iter()
            .map(joined_into_record)
            .collect()
    }
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("task title is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
