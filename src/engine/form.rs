//! Record form state
//!
//! A record form is either empty (`Idle`, ready to add) or bound to a selected row
//! (`Editing`, ready to update or delete). Transitions consume the current state and
//! return the next one; on error the caller's state is left as it was.

use serde::Serialize;

use crate::engine::records::error::Result;
use crate::engine::records::{EntityKind, FieldValues, Record, RecordError};
use crate::engine::session::{Confirm, DeleteOutcome, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum FormState {
    #[default]
    Idle,
    Editing(i64),
}

/// Result of a successful submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    /// Id of the created or updated row
    pub id: i64,
    /// Listing reloaded after the write; `None` when the reload failed
    pub rows: Option<Vec<Record>>,
}

impl FormState {
    pub fn select(self, id: i64) -> Self {
        FormState::Editing(id)
    }

    pub fn clear(self) -> Self {
        FormState::Idle
    }

    pub fn selected(&self) -> Option<i64> {
        match self {
            FormState::Idle => None,
            FormState::Editing(id) => Some(*id),
        }
    }

    pub fn can_add(&self) -> bool {
        matches!(self, FormState::Idle)
    }

    pub fn can_update(&self) -> bool {
        matches!(self, FormState::Editing(_))
    }

    pub fn can_delete(&self) -> bool {
        self.can_update()
    }

    /// Load the selected row for display and move to `Editing`
    pub fn open(self, session: &Session<'_>, kind: EntityKind, id: i64) -> Result<(Self, Record)> {
        let record = session.get(kind, id)?;
        Ok((self.select(id), record))
    }

    /// Create from `Idle`, update from `Editing`. Success returns to `Idle`.
    pub fn submit(
        self,
        session: &Session<'_>,
        kind: EntityKind,
        fields: &FieldValues,
    ) -> Result<(Self, SubmitOutcome)> {
        let id = match self {
            FormState::Idle => session.create(kind, fields)?,
            FormState::Editing(id) => {
                session.update(kind, id, fields)?;
                id
            }
        };

        let outcome = SubmitOutcome {
            id,
            rows: session.refresh(kind),
        };
        Ok((FormState::Idle, outcome))
    }

    /// Delete the selected row. A cancelled confirmation keeps the selection.
    pub fn delete(
        self,
        session: &Session<'_>,
        kind: EntityKind,
        confirmer: &dyn Confirm,
    ) -> Result<(Self, DeleteOutcome)> {
        let id = self
            .selected()
            .ok_or_else(|| RecordError::Validation("no row selected".to_string()))?;

        match session.delete(kind, id, confirmer)? {
            DeleteOutcome::Deleted => Ok((FormState::Idle, DeleteOutcome::Deleted)),
            DeleteOutcome::Cancelled => Ok((self, DeleteOutcome::Cancelled)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::auth::{AuthService, ProfileFields};
    use crate::engine::database::Database;
    use crate::engine::migrations::MigrationRunner;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        MigrationRunner::new().push(&db).unwrap();
        db
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn medal() -> FieldValues {
        fields(&[("material", "Silver"), ("color", "grey"), ("weight", "0.8"), ("quantity", "10")])
    }

    #[test]
    fn test_button_availability() {
        let idle = FormState::default();
        assert!(idle.can_add());
        assert!(!idle.can_update());
        assert!(!idle.can_delete());

        let editing = idle.select(4);
        assert_eq!(editing, FormState::Editing(4));
        assert!(!editing.can_add());
        assert!(editing.can_update());
        assert!(editing.can_delete());
        assert_eq!(editing.clear(), FormState::Idle);
    }

    #[test]
    fn test_submit_creates_then_updates() {
        let db = setup();
        let judge = AuthService::new(&db)
            .register("jo", "pw", "judge", &ProfileFields::new("Jo", "March"))
            .unwrap();
        let session = Session::new(&db, judge);

        let (state, created) = FormState::Idle.submit(&session, EntityKind::Medals, &medal()).unwrap();
        assert_eq!(state, FormState::Idle);
        assert_eq!(created.rows.as_ref().map(|r| r.len()), Some(1));

        let (state, record) = state.open(&session, EntityKind::Medals, created.id).unwrap();
        assert_eq!(state, FormState::Editing(created.id));
        assert_eq!(record.get("material"), Some(&serde_json::json!("Silver")));

        let (state, updated) = state
            .submit(&session, EntityKind::Medals, &fields(&[("quantity", "11")]))
            .unwrap();
        assert_eq!(state, FormState::Idle);
        assert_eq!(updated.id, created.id);
        let rows = updated.rows.unwrap();
        assert_eq!(rows[0].get("quantity"), Some(&serde_json::json!(11)));
    }

    #[test]
    fn test_failed_submit_leaves_state() {
        let db = setup();
        let org = AuthService::new(&db)
            .register("boss", "pw", "organizer", &ProfileFields::new("Ola", "Boss"))
            .unwrap();
        let session = Session::new(&db, org);

        let state = FormState::Editing(99);
        let err = state
            .submit(&session, EntityKind::Medals, &fields(&[("weight", "abc")]))
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
        assert!(state.can_update());
    }

    #[test]
    fn test_delete_requires_selection() {
        let db = setup();
        let org = AuthService::new(&db)
            .register("boss", "pw", "organizer", &ProfileFields::new("Ola", "Boss"))
            .unwrap();
        let session = Session::new(&db, org);

        let err = FormState::Idle
            .delete(&session, EntityKind::Medals, &|_: &str| true)
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(msg) if msg == "no row selected"));
    }

    #[test]
    fn test_delete_cancel_and_confirm() {
        let db = setup();
        let org = AuthService::new(&db)
            .register("boss", "pw", "organizer", &ProfileFields::new("Ola", "Boss"))
            .unwrap();
        let session = Session::new(&db, org);
        let id = session.create(EntityKind::Medals, &medal()).unwrap();

        let state = FormState::Idle.select(id);
        let (state, outcome) = state.delete(&session, EntityKind::Medals, &|_: &str| false).unwrap();
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(state, FormState::Editing(id));

        let (state, outcome) = state.delete(&session, EntityKind::Medals, &|_: &str| true).unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(state, FormState::Idle);
        assert!(session.list(EntityKind::Medals).unwrap().is_empty());
    }
}
