//! Database schema definitions.
//!
//! Timestamps are stored as RFC 3339 TEXT in UTC with millisecond
//! precision, so lexical order equals chronological order.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the Salesesy database.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Contacts: company is free text, grouped by its normalized form
CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    email TEXT,
    phone TEXT,
    title TEXT,
    address TEXT,
    company TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Pipelines: named sales processes
CREATE TABLE IF NOT EXISTS pipelines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

-- Stages: ordered steps of a pipeline, removed with it
CREATE TABLE IF NOT EXISTS stages (
    id TEXT PRIMARY KEY,
    pipeline_id TEXT NOT NULL,
    name TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    probability REAL NOT NULL DEFAULT 0 CHECK (probability >= 0 AND probability <= 1),
    FOREIGN KEY (pipeline_id) REFERENCES pipelines(id) ON DELETE CASCADE
);

-- Deals: pipeline/stage references are loose so deletes never cascade here
CREATE TABLE IF NOT EXISTS deals (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    amount REAL NOT NULL DEFAULT 0 CHECK (amount >= 0),
    pipeline_id TEXT,
    stage_id TEXT,
    company TEXT,
    owner TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Tasks: related_type/related_id point at a company key, contact or deal
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    subject TEXT NOT NULL,
    due_at TEXT,
    related_type TEXT,
    related_id TEXT,
    owner TEXT,
    status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'in_progress', 'done')),
    created_at TEXT NOT NULL
);

-- ====================
-- Indexes
-- ====================

CREATE INDEX IF NOT EXISTS idx_contacts_updated_at ON contacts(updated_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(last_name, first_name);

CREATE INDEX IF NOT EXISTS idx_stages_pipeline ON stages(pipeline_id, order_index);

CREATE INDEX IF NOT EXISTS idx_deals_updated_at ON deals(updated_at DESC, id);
CREATE INDEX IF NOT EXISTS idx_deals_pipeline ON deals(pipeline_id, stage_id);
CREATE INDEX IF NOT EXISTS idx_deals_company ON deals(company);

CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_at ASC);
CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner);
CREATE INDEX IF NOT EXISTS idx_tasks_related ON tasks(related_type, related_id);
";

/// Apply pragmas, the base schema and pending migrations.
///
/// Safe to call on every open.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    // Set pragmas before schema creation. In-memory databases ignore WAL.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    // Run migrations for existing databases
    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![format!("v{CURRENT_SCHEMA_VERSION}"), super::now_timestamp()],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["contacts", "deals", "pipelines", "stages", "tasks", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Apply twice - should not fail
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
    }

    #[test]
    fn test_amount_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let ok = conn.execute(
            "INSERT INTO deals (id, name, amount, created_at, updated_at) VALUES ('d1', 'A', 10, '', '')",
            [],
        );
        assert!(ok.is_ok());

        let negative = conn.execute(
            "INSERT INTO deals (id, name, amount, created_at, updated_at) VALUES ('d2', 'B', -1, '', '')",
            [],
        );
        assert!(negative.is_err());
    }

    #[test]
    fn test_stages_removed_with_pipeline() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO pipelines (id, name) VALUES ('p1', 'Sales');
             INSERT INTO stages (id, pipeline_id, name, order_index, probability) VALUES ('s1', 'p1', 'New', 0, 0.1);
             INSERT INTO deals (id, name, pipeline_id, stage_id, created_at, updated_at) VALUES ('d1', 'A', 'p1', 's1', '', '');
             DELETE FROM pipelines WHERE id = 'p1';",
        )
        .unwrap();

        let stages: i64 = conn
            .query_row("SELECT COUNT(*) FROM stages", [], |row| row.get(0))
            .unwrap();
        let deal_stage: Option<String> = conn
            .query_row("SELECT stage_id FROM deals WHERE id = 'd1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stages, 0);
        assert_eq!(deal_stage.as_deref(), Some("s1"));
    }
}
