//! Role-Based Access Policy
//!
//! A fixed permission matrix from (role, entity) to what the role may see and
//! change. Everything here is a pure function of the identity; nothing touches
//! storage.

use serde::{Deserialize, Serialize};

use super::role::{Identity, Role};
use crate::engine::records::EntityKind;

/// How far a permission reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Denied,
    /// Only the row whose id equals the caller's identity id
    Own,
    All,
}

/// View and mutate scopes a role holds on one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub view: Scope,
    pub mutate: Scope,
}

impl Grant {
    const fn new(view: Scope, mutate: Scope) -> Self {
        Self { view, mutate }
    }

    const NONE: Grant = Grant::new(Scope::Denied, Scope::Denied);
}

/// Owner-id restriction applied to a listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub owner_id: i64,
}

/// The permission matrix
pub fn grant(role: Role, entity: EntityKind) -> Grant {
    use EntityKind::*;
    use Scope::*;

    match (role, entity) {
        (Role::Athlete, Athletes) => Grant::new(Own, Denied),
        (Role::Trainer, Trainers) => Grant::new(Own, Denied),
        (Role::Judge, Judges) => Grant::new(Own, Denied),
        (Role::Judge, Medals) => Grant::new(All, All),
        // Organizers keep to their own organizer row, but may add new ones
        (Role::Organizer, Organizers) => Grant::new(Own, Own),
        (Role::Organizer, Venues | Inventories) => Grant::new(All, Denied),
        (Role::Organizer, _) => Grant::new(All, All),
        _ => Grant::NONE,
    }
}

pub fn can_view(identity: &Identity, entity: EntityKind) -> bool {
    grant(identity.role, entity).view != Scope::Denied
}

/// `target` is the id of the row being changed, `None` for a row being created.
///
/// An `Own` mutate scope admits the caller's own row and new rows.
pub fn can_mutate(identity: &Identity, entity: EntityKind, target: Option<i64>) -> bool {
    match grant(identity.role, entity).mutate {
        Scope::Denied => false,
        Scope::All => true,
        Scope::Own => target.map_or(true, |id| id == identity.id),
    }
}

/// The owner-id filter a listing must carry. `None` means unfiltered (or no access at all,
/// which `can_view` reports).
pub fn visible_row_filter(identity: &Identity, entity: EntityKind) -> Option<RowFilter> {
    match grant(identity.role, entity).view {
        Scope::Own => Some(RowFilter {
            owner_id: identity.id,
        }),
        Scope::All | Scope::Denied => None,
    }
}

/// Screens the identity may open, in display order
pub fn visible_entities(identity: &Identity) -> Vec<EntityKind> {
    EntityKind::ALL
        .into_iter()
        .filter(|kind| can_view(identity, *kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::records::EntityKind::*;

    fn who(role: Role) -> Identity {
        Identity::new(7, "someone", role)
    }

    #[test]
    fn test_matrix_view() {
        let expected: [(Role, [bool; 5]); 4] = [
            //                  Athletes Trainers Judges Medals Organizers
            (Role::Athlete, [true, false, false, false, false]),
            (Role::Trainer, [false, true, false, false, false]),
            (Role::Judge, [false, false, true, true, false]),
            (Role::Organizer, [true, true, true, true, true]),
        ];
        let entities = [Athletes, Trainers, Judges, Medals, Organizers];

        for (role, row) in expected {
            for (entity, allowed) in entities.iter().zip(row) {
                assert_eq!(can_view(&who(role), *entity), allowed, "{} viewing {}", role, entity);
            }
        }
    }

    #[test]
    fn test_profile_roles_never_mutate() {
        for role in [Role::Athlete, Role::Trainer, Role::Judge] {
            let me = who(role);
            for entity in [Athletes, Trainers, Judges, Organizers, Venues, Inventories] {
                assert!(!can_mutate(&me, entity, Some(me.id)), "{} on {}", role, entity);
                assert!(!can_mutate(&me, entity, None));
            }
        }
    }

    #[test]
    fn test_judge_mutates_medals() {
        let judge = who(Role::Judge);
        assert!(can_mutate(&judge, Medals, Some(1)));
        assert!(can_mutate(&judge, Medals, None));
        assert_eq!(visible_row_filter(&judge, Medals), None);
    }

    #[test]
    fn test_organizer_on_organizers_own_row_only() {
        let org = who(Role::Organizer);
        assert!(can_view(&org, Organizers));
        assert_eq!(visible_row_filter(&org, Organizers), Some(RowFilter { owner_id: 7 }));
        assert!(can_mutate(&org, Organizers, Some(7)));
        assert!(!can_mutate(&org, Organizers, Some(8)));
        assert!(can_mutate(&org, Organizers, None));
    }

    #[test]
    fn test_organizer_mutates_everything_else() {
        let org = who(Role::Organizer);
        for entity in [Athletes, Trainers, Judges, Medals] {
            assert!(can_mutate(&org, entity, Some(123)));
            assert_eq!(visible_row_filter(&org, entity), None);
        }
        assert!(!can_mutate(&org, Venues, None));
    }

    #[test]
    fn test_own_row_filters() {
        assert_eq!(
            visible_row_filter(&who(Role::Athlete), Athletes),
            Some(RowFilter { owner_id: 7 })
        );
        assert_eq!(
            visible_row_filter(&who(Role::Judge), Judges),
            Some(RowFilter { owner_id: 7 })
        );
    }

    #[test]
    fn test_visible_entities_order() {
        assert_eq!(visible_entities(&who(Role::Athlete)), vec![Athletes]);
        assert_eq!(visible_entities(&who(Role::Judge)), vec![Judges, Medals]);
        assert_eq!(visible_entities(&who(Role::Organizer)), EntityKind::ALL.to_vec());
    }
}
