//! SportsOrg Migrations Module
//! Embedded schema migrations, applied in order and journaled with checksums

use crate::engine::database::{self, Database, DatabaseError};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Schema drift detected: {0}")]
    SchemaDrift(String),
    #[error("Unknown migration in journal: {0}")]
    Unknown(String),
    #[error("SQL execution error: {0}")]
    SqlError(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn checksum(&self) -> String {
        compute_checksum(self.sql)
    }
}

/// Every migration the application knows, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_sports_schema",
        sql: include_str!("../../sql/migrations/0001_sports_schema.sql"),
    },
    Migration {
        name: "0002_username_uniqueness",
        sql: include_str!("../../sql/migrations/0002_username_uniqueness.sql"),
    },
];

#[derive(Debug)]
pub struct MigrationStatus {
    pub applied_count: usize,
    pub pending_count: usize,
    pub pending_migrations: Vec<String>,
}

pub struct MigrationRunner {
    migrations: &'static [Migration],
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: MIGRATIONS,
        }
    }

    pub(crate) fn with_migrations(migrations: &'static [Migration]) -> Self {
        Self { migrations }
    }

    /// Migrations not yet in the journal. Fails if an applied migration changed since it ran.
    pub fn list_pending(&self, db: &Database) -> Result<Vec<&'static Migration>, MigrationError> {
        let applied = db.get_applied_migrations()?;

        for (name, checksum) in &applied {
            let known = self
                .migrations
                .iter()
                .find(|m| m.name == name.as_str())
                .ok_or_else(|| MigrationError::Unknown(name.clone()))?;
            if &known.checksum() != checksum {
                return Err(MigrationError::SchemaDrift(format!(
                    "{} was modified after it was applied",
                    name
                )));
            }
        }

        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|(name, _)| name.as_str() == m.name))
            .collect())
    }

    pub fn apply(&self, db: &Database, migration: &Migration) -> Result<(), MigrationError> {
        let mut conn = db.get_connection()?;

        // Dropping the transaction without commit rolls it back
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        database::record_migration(&tx, migration.name, &migration.checksum())?;
        tx.commit()?;

        info!(migration = migration.name, "migration applied");
        Ok(())
    }

    /// Apply every pending migration, returning the names applied
    pub fn push(&self, db: &Database) -> Result<Vec<String>, MigrationError> {
        let pending = self.list_pending(db)?;
        let mut applied = Vec::new();

        for migration in pending {
            self.apply(db, migration)?;
            applied.push(migration.name.to_string());
        }

        Ok(applied)
    }

    pub fn check(&self, db: &Database) -> Result<MigrationStatus, MigrationError> {
        let applied = db.get_applied_migrations()?;
        let pending = self.list_pending(db)?;

        Ok(MigrationStatus {
            applied_count: applied.len(),
            pending_count: pending.len(),
            pending_migrations: pending.iter().map(|m| m.name.to_string()).collect(),
        })
    }
}

fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    let result = hasher.finalize();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_creates_schema() {
        let db = Database::in_memory().unwrap();
        let applied = MigrationRunner::new().push(&db).unwrap();
        assert_eq!(applied, vec!["0001_sports_schema", "0002_username_uniqueness"]);

        let tables = db.get_tables().unwrap();
        for table in [
            "athletes",
            "trainers",
            "judges",
            "organizers",
            "medals",
            "venues",
            "sports_inventories",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing {}", table);
        }
    }

    #[test]
    fn test_push_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let runner = MigrationRunner::new();
        runner.push(&db).unwrap();
        assert!(runner.push(&db).unwrap().is_empty());

        let status = runner.check(&db).unwrap();
        assert_eq!(status.applied_count, MIGRATIONS.len());
        assert_eq!(status.pending_count, 0);
    }

    #[test]
    fn test_drift_detected() {
        static EDITED: &[Migration] = &[Migration {
            name: "0001_sports_schema",
            sql: "CREATE TABLE something_else (id INTEGER);",
        }];

        let db = Database::in_memory().unwrap();
        MigrationRunner::new().push(&db).unwrap();

        let err = MigrationRunner::with_migrations(EDITED).check(&db).unwrap_err();
        assert!(matches!(err, MigrationError::SchemaDrift(_)));
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        static BROKEN: &[Migration] = &[Migration {
            name: "0001_broken",
            sql: "CREATE TABLE half_done (id INTEGER); THIS IS NOT SQL;",
        }];

        let db = Database::in_memory().unwrap();
        let runner = MigrationRunner::with_migrations(BROKEN);
        assert!(runner.push(&db).is_err());
        assert!(db.get_tables().unwrap().is_empty());
        assert!(db.get_applied_migrations().unwrap().is_empty());
    }

    #[test]
    fn test_checksum_stable() {
        assert_eq!(compute_checksum("SELECT 1"), compute_checksum("SELECT 1"));
        assert_ne!(compute_checksum("SELECT 1"), compute_checksum("SELECT 2"));
    }
}
