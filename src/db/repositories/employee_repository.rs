use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::db::repositories::{deserialize_labels, parse_datetime, serialize_labels};
use crate::error::AppResult;
use crate::models::employee::EmployeeRecord;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        organization_id,
        name,
        email,
        password_hash,
        role,
        department,
        skills,
        wallet_address,
        is_active,
        joined_at
    FROM employees
"#;

#[derive(Debug, Clone)]
pub struct EmployeeRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub department: String,
    pub skills: String,
    pub wallet_address: Option<String>,
    pub is_active: bool,
    pub joined_at: String,
}

impl EmployeeRow {
    pub fn from_record(record: &EmployeeRecord, password_hash: Option<String>) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            organization_id: record.organization_id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            password_hash,
            role: record.role.clone(),
            department: record.department.clone(),
            skills: serialize_labels(&record.skills)?,
            wallet_address: record.wallet_address.clone(),
            is_active: record.is_active,
            joined_at: record.joined_at.to_rfc3339(),
        })
    }

    pub fn into_record(self) -> AppResult<EmployeeRecord> {
        Ok(EmployeeRecord {
            joined_at: parse_datetime(&self.joined_at)?,
            skills: deserialize_labels(&self.skills)?,
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            email: self.email,
            role: self.role,
            department: self.department,
            wallet_address: self.wallet_address,
            is_active: self.is_active,
        })
    }
}

pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn insert(conn: &Connection, row: &EmployeeRow) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO employees (
                id, organization_id, name, email, password_hash, role,
                department, skills, wallet_address, is_active, joined_at
            )
            VALUES (
                :id, :organization_id, :name, :email, :password_hash, :role,
                :department, :skills, :wallet_address, :is_active, :joined_at
            )
            "#,
            named_params! {
                ":id": row.id,
                ":organization_id": row.organization_id,
                ":name": row.name,
                ":email": row.email,
                ":password_hash": row.password_hash,
                ":role": row.role,
                ":department": row.department,
                ":skills": row.skills,
                ":wallet_address": row.wallet_address,
                ":is_active": row.is_active,
                ":joined_at": row.joined_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &EmployeeRow) -> AppResult<()> {
        conn.execute(
            r#"
            UPDATE employees SET
                name = :name,
                email = :email,
                password_hash = :password_hash,
                role = :role,
                department = :department,
                skills = :skills,
                wallet_address = :wallet_address,
                is_active = :is_active
            WHERE id = :id AND organization_id = :organization_id
            "#,
            named_params! {
                ":id": row.id,
                ":organization_id": row.organization_id,
                ":name": row.name,
                ":email": row.email,
                ":password_hash": row.password_hash,
                ":role": row.role,
                ":department": row.department,
                ":skills": row.skills,
                ":wallet_address": row.wallet_address,
                ":is_active": row.is_active,
            },
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, organization_id: &str, id: &str) -> AppResult<bool> {
        let affected = conn.execute(
            "DELETE FROM employees WHERE id = :id AND organization_id = :organization_id",
            named_params! { ":id": id, ":organization_id": organization_id },
        )?;
        Ok(affected > 0)
    }

    pub fn find_by_id(
        conn: &Connection,
        organization_id: &str,
        id: &str,
    ) -> AppResult<Option<EmployeeRow>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id AND organization_id = :organization_id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(
                named_params! { ":id": id, ":organization_id": organization_id },
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Portal login lookup: email is globally unique and only active
    /// employees may authenticate.
    pub fn find_active_by_email(conn: &Connection, email: &str) -> AppResult<Option<EmployeeRow>> {
        let sql = format!("{BASE_SELECT} WHERE email = :email AND is_active = 1");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! { ":email": email }, map_row)
            .optional()?;
        Ok(row)
    }

    pub fn list_by_organization(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<EmployeeRow>> {
        let sql = format!(
            "{BASE_SELECT} WHERE organization_id = :organization_id ORDER BY joined_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_by_organization_by_name(
        conn: &Connection,
        organization_id: &str,
    ) -> AppResult<Vec<EmployeeRow>> {
        let sql =
            format!("{BASE_SELECT} WHERE organization_id = :organization_id ORDER BY name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_active(conn: &Connection, organization_id: &str) -> AppResult<Vec<EmployeeRow>> {
        let sql = format!(
            "{BASE_SELECT} WHERE organization_id = :organization_id AND is_active = 1 ORDER BY name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! { ":organization_id": organization_id }, map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Current workload counts for one employee: (active, completed).
    pub fn task_counts(conn: &Connection, employee_id: &str) -> AppResult<(i64, i64)> {
        let counts = conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tasks
                 WHERE employee_id = :employee_id AND status != 'Completed'),
                (SELECT COUNT(*) FROM tasks
                 WHERE employee_id = :employee_id AND status = 'Completed')
            "#,
            named_params! { ":employee_id": employee_id },
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<EmployeeRow> {
    Ok(EmployeeRow {
        id: row.get("id")?,
        organization_id: row.get("organization_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: row.get("role")?,
        department: row.get("department")?,
        skills: row.get("skills")?,
        wallet_address: row.get("wallet_address")?,
        is_active: row.get("is_active")?,
        joined_at: row.get("joined_at")?,
    })
}
