//! RBAC Enforcement Layer
//!
//! Turns policy decisions into errors for a specific identity, so callers can
//! `?` an authorization check before touching storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::policy::{self, RowFilter};
use super::role::Identity;
use crate::engine::records::EntityKind;

/// What the caller was attempting when access was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    View,
    Create,
    Update,
    Delete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{role} '{username}' may not {operation:?} {entity}{}", .target.map(|id| format!(" record {}", id)).unwrap_or_default())]
pub struct AccessDenied {
    pub username: String,
    pub role: String,
    pub operation: Operation,
    pub entity: EntityKind,
    pub target: Option<i64>,
}

pub struct Enforcer<'a> {
    identity: &'a Identity,
}

impl<'a> Enforcer<'a> {
    pub fn new(identity: &'a Identity) -> Self {
        Self { identity }
    }

    /// Check view access and return the row filter the listing must apply
    pub fn authorize_view(&self, entity: EntityKind) -> Result<Option<RowFilter>, AccessDenied> {
        if !policy::can_view(self.identity, entity) {
            return Err(self.deny(Operation::View, entity, None));
        }
        Ok(policy::visible_row_filter(self.identity, entity))
    }

    /// Check a single-row read: the row must fall inside the caller's view filter
    pub fn authorize_read(&self, entity: EntityKind, id: i64) -> Result<(), AccessDenied> {
        match self.authorize_view(entity)? {
            Some(filter) if filter.owner_id != id => {
                Err(self.deny(Operation::View, entity, Some(id)))
            }
            _ => Ok(()),
        }
    }

    pub fn authorize_mutation(
        &self,
        operation: Operation,
        entity: EntityKind,
        target: Option<i64>,
    ) -> Result<(), AccessDenied> {
        if policy::can_mutate(self.identity, entity, target) {
            Ok(())
        } else {
            Err(self.deny(operation, entity, target))
        }
    }

    fn deny(&self, operation: Operation, entity: EntityKind, target: Option<i64>) -> AccessDenied {
        AccessDenied {
            username: self.identity.username.clone(),
            role: self.identity.role.to_string(),
            operation,
            entity,
            target,
        }
    }
}
