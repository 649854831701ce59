//! Records Module
//!
//! Entity schema descriptors and the generic repository built on them

pub mod error;
pub mod repository;
pub mod schema;
pub mod value;

pub use error::RecordError;
pub use repository::{FieldValues, Record, RecordRepository};
pub use schema::{EntityKind, EntitySchema, FieldSpec, FieldType, LookupJoin};
pub use value::{display_date, parse_date, SqlValue};
