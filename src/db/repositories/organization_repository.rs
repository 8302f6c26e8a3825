use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::db::repositories::parse_datetime;
use crate::error::AppResult;
use crate::models::organization::OrganizationRecord;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        name,
        email,
        password_hash,
        industry,
        created_at
    FROM organizations
"#;

#[derive(Debug, Clone)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub industry: Option<String>,
    pub created_at: String,
}

impl OrganizationRow {
    /// The credential hash stays behind in the row; records are safe to hand
    /// to API consumers.
    pub fn into_record(self) -> AppResult<OrganizationRecord> {
        Ok(OrganizationRecord {
            id: self.id,
            name: self.name,
            email: self.email,
            industry: self.industry,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

pub struct OrganizationRepository;

impl OrganizationRepository {
    pub fn insert(conn: &Connection, row: &OrganizationRow) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO organizations (id, name, email, password_hash, industry, created_at)
            VALUES (:id, :name, :email, :password_hash, :industry, :created_at)
            "#,
            named_params! {
                ":id": row.id,
                ":name": row.name,
                ":email": row.email,
                ":password_hash": row.password_hash,
                ":industry": row.industry,
                ":created_at": row.created_at,
            },
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<OrganizationRow>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! { ":id": id }, map_row)
            .optional()?;
        Ok(row)
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<OrganizationRow>> {
        let sql = format!("{BASE_SELECT} WHERE email = :email");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! { ":email": email }, map_row)
            .optional()?;
        Ok(row)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<OrganizationRow> {
    Ok(OrganizationRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        industry: row.get("industry")?,
        created_at: row.get("created_at")?,
    })
}
