//! Auth Service
//!
//! Registration and login against the four per-role account tables.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::password::PasswordService;
use crate::engine::database::{self, Database, DatabaseError};
use crate::engine::rbac::{Identity, Role};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("A user with username '{0}' already exists")]
    DuplicateUsername(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Storage(DatabaseError::SqliteError(e))
    }
}

/// Profile data captured at registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: String,
}

impl ProfileFields {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

pub struct AuthService<'a> {
    db: &'a Database,
    passwords: PasswordService,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            passwords: PasswordService::new(),
        }
    }

    /// Create an account in the table for `role` and return its identity.
    ///
    /// The duplicate check and the insert share one immediate transaction. A
    /// uniqueness violation raised by the database itself also maps to
    /// `DuplicateUsername`.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        role: &str,
        profile: &ProfileFields,
    ) -> Result<Identity, AuthError> {
        let role: Role = role
            .parse()
            .map_err(|_| AuthError::InvalidRole(role.to_string()))?;

        let username = username.trim();
        require("username", username)?;
        require("password", password)?;
        require("first name", &profile.first_name)?;
        require("last name", &profile.last_name)?;

        let hash = self
            .passwords
            .hash_password(password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let schema = role.profile_entity().schema();
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if username_taken(&tx, username)? {
            warn!(username, "registration rejected: username taken");
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let id = insert_account(&tx, schema.table, username, &hash, profile)?;
        tx.commit()?;

        info!(username, role = %role, id, "user registered");
        Ok(Identity::new(id, username, role))
    }

    /// Resolve credentials to an identity.
    ///
    /// Role tables are tried in [`Role::ALL`] order; the first table whose stored
    /// hash verifies wins.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let conn = self.db.get_connection()?;
        for role in Role::ALL {
            let schema = role.profile_entity().schema();
            let row: Option<(i64, Option<String>)> = conn
                .query_row(
                    &format!(
                        "SELECT \"{}\", passwordhash FROM \"{}\" WHERE username = ?1",
                        schema.id_column, schema.table
                    ),
                    [username],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            if let Some((id, Some(hash))) = row {
                if self.passwords.verify_password(password, &hash) {
                    info!(username, role = %role, id, "user authenticated");
                    return Ok(Identity::new(id, username, role));
                }
            }
        }

        warn!(username, "authentication failed");
        Err(AuthError::InvalidCredentials)
    }
}

fn require(name: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(name));
    }
    Ok(())
}

/// Insert the account row. A uniqueness violation from the database becomes `DuplicateUsername`.
fn insert_account(
    tx: &Transaction<'_>,
    table: &str,
    username: &str,
    hash: &str,
    profile: &ProfileFields,
) -> Result<i64, AuthError> {
    let inserted = tx.execute(
        &format!(
            "INSERT INTO \"{}\" (username, passwordhash, firstname, lastname) VALUES (?1, ?2, ?3, ?4)",
            table
        ),
        params![username, hash, profile.first_name, profile.last_name],
    );
    match inserted {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(e) if database::is_constraint_violation(&e) => {
            warn!(username, "registration rejected by uniqueness constraint");
            Err(AuthError::DuplicateUsername(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// True if any role table already holds `username`
fn username_taken(conn: &Connection, username: &str) -> Result<bool, AuthError> {
    for role in Role::ALL {
        let table = role.profile_entity().schema().table;
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM \"{}\" WHERE username = ?1 LIMIT 1", table),
                [username],
                |_| Ok(()),
            )
            .optional()?;
        if found.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}
