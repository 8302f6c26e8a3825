use chrono::Utc;
use tracing::info;

use crate::db::repositories::employee_repository::{EmployeeRepository, EmployeeRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::employee::{
    EmployeeCreateInput, EmployeeRecord, EmployeeUpdateInput, EmployeeWithStats,
};
use crate::models::session::Principal;
use crate::utils::password;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct EmployeeService {
    db: DbPool,
}

impl EmployeeService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_employee(
        &self,
        principal: &Principal,
        input: EmployeeCreateInput,
    ) -> AppResult<EmployeeRecord> {
        principal.require_admin()?;

        let name = required_field(&input.name, "name")?;
        let email = required_field(&input.email, "email")?;
        let role = required_field(&input.role, "role")?;
        let department = required_field(&input.department, "department")?;
        let password_hash = input
            .password
            .as_deref()
            .map(portal_credential_hash)
            .transpose()?;

        let record = EmployeeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: principal.organization_id.clone(),
            name,
            email,
            role,
            department,
            skills: input.skills.unwrap_or_default(),
            wallet_address: input.wallet_address,
            is_active: true,
            joined_at: Utc::now(),
        };

        let row = EmployeeRow::from_record(&record, password_hash)?;
        self.db
            .with_connection(|conn| EmployeeRepository::insert(conn, &row))?;
        info!(target: "app::employees", employee_id = %record.id, "employee created");
        Ok(record)
    }

    pub fn update_employee(
        &self,
        principal: &Principal,
        id: &str,
        update: EmployeeUpdateInput,
    ) -> AppResult<EmployeeRecord> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let existing = EmployeeRepository::find_by_id(&conn, &principal.organization_id, id)?
            .ok_or_else(AppError::not_found)?;

        let mut password_hash = existing.password_hash.clone();
        if let Some(new_password) = update.password.as_deref() {
            password_hash = Some(portal_credential_hash(new_password)?);
        }

        let mut record = existing.into_record()?;
        if let Some(name) = update.name {
            record.name = required_field(&name, "name")?;
        }
        if let Some(email) = update.email {
            record.email = required_field(&email, "email")?;
        }
        if let Some(role) = update.role {
            record.role = required_field(&role, "role")?;
        }
        if let Some(department) = update.department {
            record.department = required_field(&department, "department")?;
        }
        if let Some(skills) = update.skills {
            record.skills = skills;
        }
        if let Some(wallet_address) = update.wallet_address {
            record.wallet_address = wallet_address;
        }
        if let Some(is_active) = update.is_active {
            record.is_active = is_active;
        }

        let row = EmployeeRow::from_record(&record, password_hash)?;
        EmployeeRepository::update(&conn, &row)?;
        info!(target: "app::employees", employee_id = %record.id, "employee updated");
        Ok(record)
    }

    /// Removes the employee; their tasks stay behind with the assignee
    /// detached.
    pub fn delete_employee(&self, principal: &Principal, id: &str) -> AppResult<()> {
        principal.require_admin()?;

        let deleted = self.db.with_connection(|conn| {
            EmployeeRepository::delete(conn, &principal.organization_id, id)
        })?;
        if !deleted {
            return Err(AppError::not_found());
        }
        info!(target: "app::employees", employee_id = %id, "employee deleted");
        Ok(())
    }

    pub fn get_employee(&self, principal: &Principal, id: &str) -> AppResult<EmployeeWithStats> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let row = EmployeeRepository::find_by_id(&conn, &principal.organization_id, id)?
            .ok_or_else(AppError::not_found)?;
        let (active_tasks, completed_tasks) = EmployeeRepository::task_counts(&conn, id)?;
        Ok(EmployeeWithStats {
            employee: row.into_record()?,
            active_tasks,
            completed_tasks,
        })
    }

    /// Newest hires first, each with current task counts.
    pub fn list_employees(&self, principal: &Principal) -> AppResult<Vec<EmployeeWithStats>> {
        principal.require_admin()?;

        let conn = self.db.get_connection()?;
        let rows = EmployeeRepository::list_by_organization(&conn, &principal.organization_id)?;

        let mut employees = Vec::with_capacity(rows.len());
        for row in rows {
            let (active_tasks, completed_tasks) = EmployeeRepository::task_counts(&conn, &row.id)?;
            employees.push(EmployeeWithStats {
                employee: row.into_record()?,
                active_tasks,
                completed_tasks,
            });
        }
        Ok(employees)
    }
}

fn required_field(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn portal_credential_hash(raw: &str) -> AppResult<String> {
    if raw.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(password::hash_password(raw))
}
