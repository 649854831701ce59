//! SportsOrg Database Module
//! SQLite handle with a single process-wide pooled connection

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Journal of applied schema migrations
pub const MIGRATIONS_TABLE: &str = "_sportsorg_migrations";

pub const MEMORY_PATH: &str = ":memory:";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool: {0}")]
    PoolError(#[from] r2d2::Error),
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl DatabaseError {
    /// True when SQLite rejected the statement on a UNIQUE, CHECK or trigger constraint
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DatabaseError::SqliteError(e) => is_constraint_violation(e),
            DatabaseError::PoolError(_) => false,
        }
    }
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Shared database handle.
///
/// The pool holds exactly one connection for the lifetime of the process. Every
/// caller blocks on that connection, so there is no concurrent access to model.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `db_path`. `:memory:` opens a private in-memory database.
    pub fn open(db_path: &Path) -> Result<Self, DatabaseError> {
        if db_path == Path::new(MEMORY_PATH) {
            return Self::in_memory();
        }

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(configure_connection);
        let db = Self::with_manager(manager, db_path.to_path_buf())?;
        let _: String = db
            .get_connection()?
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory().with_init(configure_connection);
        Self::with_manager(manager, PathBuf::from(MEMORY_PATH))
    }

    fn with_manager(manager: SqliteConnectionManager, path: PathBuf) -> Result<Self, DatabaseError> {
        // An in-memory database lives only as long as its connection, so it must never be recycled.
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let db = Self { pool, path };
        db.init_journal()?;
        debug!(path = %db.path.display(), "database opened");
        Ok(db)
    }

    fn init_journal(&self) -> Result<(), DatabaseError> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    applied_at TEXT NOT NULL,
                    checksum TEXT NOT NULL
                )"
            ),
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_connection(&self) -> Result<DbConnection, DatabaseError> {
        Ok(self.pool.get()?)
    }

    /// Applied migrations as (name, checksum), in application order
    pub fn get_applied_migrations(&self) -> Result<Vec<(String, String)>, DatabaseError> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT name, checksum FROM {MIGRATIONS_TABLE} ORDER BY id"
        ))?;
        let migrations = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(migrations)
    }

    pub fn get_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE '\\_sportsorg\\_%' ESCAPE '\\' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tables)
    }

    pub fn row_count(&self, table: &str) -> Result<u64, DatabaseError> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }
}

/// Record a migration inside the caller's transaction
pub(crate) fn record_migration(conn: &Connection, name: &str, checksum: &str) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {MIGRATIONS_TABLE} (name, applied_at, checksum) VALUES (?1, ?2, ?3)"
        ),
        params![name, chrono::Utc::now().to_rfc3339(), checksum],
    )?;
    Ok(())
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_has_journal() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_applied_migrations().unwrap().is_empty());
        // journal table is internal and never listed
        assert!(db.get_tables().unwrap().is_empty());
    }

    #[test]
    fn test_memory_path_opens_in_memory() {
        let db = Database::open(Path::new(MEMORY_PATH)).unwrap();
        assert_eq!(db.path(), Path::new(MEMORY_PATH));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sports.db");
        {
            let db = Database::open(&path).unwrap();
            db.get_connection()
                .unwrap()
                .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_tables().unwrap(), vec!["t".to_string()]);
        assert_eq!(db.row_count("t").unwrap(), 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_connection().unwrap();
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }
}
