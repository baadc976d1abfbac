//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded into the binary using `include_str!`, so the binary carries
//! no runtime file dependencies.

use rusqlite::{Connection, Result};
use tracing::{debug, info, warn};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
///
/// Version names match the SQL filenames (without .sql extension).
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_add_contact_title",
        sql: include_str!("../../migrations/001_add_contact_title.sql"),
    },
    Migration {
        version: "002_add_contact_address",
        sql: include_str!("../../migrations/002_add_contact_address.sql"),
    },
];

/// Run all pending migrations on the database.
///
/// Already-applied migrations (tracked in `schema_migrations`) are
/// skipped, so this runs on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply. ALTER TABLE errors for
/// duplicate columns are logged and the migration is marked applied, since
/// fresh databases get those columns from the base DDL.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        if let Err(e) = conn.execute_batch(migration.sql) {
            if e.to_string().contains("duplicate column name") {
                debug!(
                    version = migration.version,
                    "Columns already present, marking migration complete"
                );
            } else {
                warn!(version = migration.version, error = %e, "Migration failed");
                return Err(e);
            }
        } else {
            info!(version = migration.version, "Applied migration");
        }

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, super::now_timestamp()],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::SCHEMA_SQL;

    fn migration_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version NOT LIKE 'v%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).expect("Base schema should apply");
        run_migrations(&conn).expect("Migrations should apply to fresh database");

        assert_eq!(migration_count(&conn), MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed");

        assert_eq!(migration_count(&conn), MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_legacy_contacts_table_gains_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE contacts (
                id TEXT PRIMARY KEY, first_name TEXT, last_name TEXT, email TEXT,
                phone TEXT, company TEXT, created_at TEXT NOT NULL, updated_at TEXT NOT NULL
            );
            INSERT INTO contacts (id, first_name, created_at, updated_at) VALUES ('c1', 'Ava', '', '');",
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let (title, address): (Option<String>, Option<String>) = conn
            .query_row("SELECT title, address FROM contacts WHERE id = 'c1'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert!(title.is_none());
        assert!(address.is_none());
    }
}
