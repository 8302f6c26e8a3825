use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

const BASE_SELECT: &str = r#"
    SELECT
        token,
        role,
        principal_id,
        organization_id,
        created_at,
        expires_at
    FROM sessions
"#;

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub token: String,
    pub role: String,
    pub principal_id: String,
    pub organization_id: String,
    pub created_at: String,
    pub expires_at: String,
}

pub struct SessionRepository;

impl SessionRepository {
    pub fn insert(conn: &Connection, row: &SessionRow) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO sessions (token, role, principal_id, organization_id, created_at, expires_at)
            VALUES (:token, :role, :principal_id, :organization_id, :created_at, :expires_at)
            "#,
            named_params! {
                ":token": row.token,
                ":role": row.role,
                ":principal_id": row.principal_id,
                ":organization_id": row.organization_id,
                ":created_at": row.created_at,
                ":expires_at": row.expires_at,
            },
        )?;
        Ok(())
    }

    pub fn find_by_token(conn: &Connection, token: &str) -> AppResult<Option<SessionRow>> {
        let sql = format!("{BASE_SELECT} WHERE token = :token");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(named_params! { ":token": token }, map_row)
            .optional()?;
        Ok(row)
    }

    pub fn delete_by_token(conn: &Connection, token: &str) -> AppResult<bool> {
        let affected = conn.execute(
            "DELETE FROM sessions WHERE token = :token",
            named_params! { ":token": token },
        )?;
        Ok(affected > 0)
    }

    /// Housekeeping sweep; verification also drops expired rows lazily.
    pub fn purge_expired(conn: &Connection, now: &str) -> AppResult<usize> {
        let affected = conn.execute(
            "DELETE FROM sessions WHERE expires_at < :now",
            named_params! { ":now": now },
        )?;
        Ok(affected)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        token: row.get("token")?,
        role: row.get("role")?,
        principal_id: row.get("principal_id")?,
        organization_id: row.get("organization_id")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}
