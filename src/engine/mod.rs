// SportsOrg Engine - Core module structure
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod form;
pub mod migrations;
pub mod rbac;
pub mod records;
pub mod session;

pub use auth::{AuthError, AuthService, ProfileFields};
pub use config::Config;
pub use database::Database;
pub use form::{FormState, SubmitOutcome};
pub use rbac::{Identity, Role};
pub use records::{EntityKind, FieldValues, Record, RecordError};
pub use session::{Confirm, DeleteOutcome, Session};

use migrations::{MigrationError, MigrationRunner};
use std::path::Path;
use tracing::info;

/// Open the database at `path`, applying pending migrations when `auto_migrate` is set
pub fn open_database(path: &Path, auto_migrate: bool) -> Result<Database, MigrationError> {
    let db = Database::open(path)?;
    if auto_migrate {
        let applied = MigrationRunner::new().push(&db)?;
        if !applied.is_empty() {
            info!(count = applied.len(), "schema migrated");
        }
    }
    Ok(db)
}
