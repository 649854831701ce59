//! Record Error Types

use thiserror::Error;

use crate::engine::database::DatabaseError;
use crate::engine::rbac::AccessDenied;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} record {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Access denied: {0}")]
    Forbidden(#[from] AccessDenied),

    #[error("{0} are read-only")]
    ReadOnly(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Storage(DatabaseError::SqliteError(e))
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;
