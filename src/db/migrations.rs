use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::error::AppResult;

const USER_VERSION: i32 = 1;

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 1, "Add wallet addresses and task completion proofs")?;
    }

    debug_assert_eq!(current_version, USER_VERSION);

    Ok(())
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE employees ADD COLUMN wallet_address TEXT;
        ALTER TABLE tasks ADD COLUMN proof_ref TEXT;
        "#,
    )?;
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, description: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![version, description, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
