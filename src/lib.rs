//! SportsOrg - records core for a sports organization
//! Accounts for four roles, role-gated CRUD over the organization's tables

pub mod engine;

pub use engine::{
    open_database, AuthError, AuthService, Config, Confirm, Database, DeleteOutcome, EntityKind,
    FieldValues, FormState, Identity, ProfileFields, Record, RecordError, Role, Session,
    SubmitOutcome,
};
