//! Authenticated session
//!
//! The only CRUD surface the presentation layer calls. Every operation runs the
//! access policy for the session identity before any storage access.

use serde::Serialize;
use tracing::{info, warn};

use crate::engine::database::Database;
use crate::engine::rbac::{self, Enforcer, Identity, Operation};
use crate::engine::records::error::Result;
use crate::engine::records::{EntityKind, FieldValues, Record, RecordRepository};

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

pub struct Session<'a> {
    identity: Identity,
    repo: RecordRepository<'a>,
}

impl<'a> Session<'a> {
    pub fn new(db: &'a Database, identity: Identity) -> Self {
        Self {
            identity,
            repo: RecordRepository::new(db),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn visible_entities(&self) -> Vec<EntityKind> {
        rbac::visible_entities(&self.identity)
    }

    fn enforcer(&self) -> Enforcer<'_> {
        Enforcer::new(&self.identity)
    }

    /// Rows of `kind` this identity may see; own-row roles get exactly their row
    pub fn list(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let filter = self.enforcer().authorize_view(kind)?;
        self.repo.list(kind, filter)
    }

    pub fn get(&self, kind: EntityKind, id: i64) -> Result<Record> {
        self.enforcer().authorize_read(kind, id)?;
        self.repo.get(kind, id)
    }

    pub fn create(&self, kind: EntityKind, fields: &FieldValues) -> Result<i64> {
        self.enforcer().authorize_mutation(Operation::Create, kind, None)?;
        let id = self.repo.create(kind, fields)?;
        info!(user = %self.identity.username, entity = %kind, id, "created");
        Ok(id)
    }

    pub fn update(&self, kind: EntityKind, id: i64, fields: &FieldValues) -> Result<()> {
        self.enforcer().authorize_mutation(Operation::Update, kind, Some(id))?;
        self.repo.update(kind, id, fields)?;
        info!(user = %self.identity.username, entity = %kind, id, "updated");
        Ok(())
    }

    /// Delete after the confirmer agrees. Access is checked before asking.
    pub fn delete(&self, kind: EntityKind, id: i64, confirmer: &dyn Confirm) -> Result<DeleteOutcome> {
        self.enforcer().authorize_mutation(Operation::Delete, kind, Some(id))?;

        let prompt = format!("Delete {} record {}?", kind.singular(), id);
        if !confirmer.confirm(&prompt) {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.repo.delete(kind, id)?;
        info!(user = %self.identity.username, entity = %kind, id, "deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Best-effort reload after a write. A failure here is logged and never undoes the write.
    pub fn refresh(&self, kind: EntityKind) -> Option<Vec<Record>> {
        match self.list(kind) {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(entity = %kind, error = %e, "refresh after write failed");
                None
            }
        }
    }
}
