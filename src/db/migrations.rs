use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 4;

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        // Foreign keys are per-connection in SQLite
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
            log::debug!("Applied schema migration v{}", version);
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations.insert(3, migration_v3);
    migrations.insert(4, migration_v4);
    migrations
}

/// Migration v1: companies
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE companies (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            job_role TEXT NOT NULL DEFAULT '',
            apply_route TEXT NOT NULL DEFAULT '',
            deadline TEXT NULL,
            memo TEXT NOT NULL DEFAULT '',
            status_text TEXT NOT NULL DEFAULT '',
            created_ts INTEGER NOT NULL,
            updated_ts INTEGER NOT NULL
        )",
        [],
    )?;
    // Note: deadline is an ISO date (YYYY-MM-DD); status_text is stored verbatim,
    // including legacy encodings, and only normalized when a stage is saved.

    tx.execute(
        "CREATE INDEX idx_companies_deadline ON companies(deadline)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_companies_updated ON companies(updated_ts)",
        [],
    )?;

    Ok(())
}

/// Migration v2: entry-sheet versions
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE es_versions (
            id INTEGER PRIMARY KEY,
            company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            body TEXT NOT NULL DEFAULT '',
            submitted_at TEXT NULL,
            submitted_via TEXT NOT NULL DEFAULT '',
            result TEXT NOT NULL DEFAULT 'UNKNOWN' CHECK(result IN ('UNKNOWN','PASS','FAIL')),
            memo TEXT NOT NULL DEFAULT '',
            created_ts INTEGER NOT NULL,
            updated_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_es_versions_company ON es_versions(company_id, created_ts)",
        [],
    )?;

    Ok(())
}

/// Migration v3: Add attachment path to es_versions
fn migration_v3(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "ALTER TABLE es_versions ADD COLUMN file TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    Ok(())
}

/// Migration v4: audit events for data writes
fn migration_v4(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    // No foreign key: events outlive the records they describe
    tx.execute(
        "CREATE TABLE audit_events (
            id INTEGER PRIMARY KEY,
            ts INTEGER NOT NULL,
            action TEXT NOT NULL,
            target_type TEXT NOT NULL,
            target_id INTEGER NOT NULL,
            payload_json TEXT NOT NULL DEFAULT '{}'
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_audit_events_ts ON audit_events(ts)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_audit_events_target ON audit_events(target_type, target_id)",
        [],
    )?;
    Ok(())
}
