//! RBAC Module
//!
//! Roles, session identities and the fixed access policy

pub mod role;
pub mod policy;
pub mod enforcer;

pub use role::{Identity, Role, UnknownRole};
pub use policy::{can_mutate, can_view, grant, visible_entities, visible_row_filter, Grant, RowFilter, Scope};
pub use enforcer::{AccessDenied, Enforcer, Operation};
