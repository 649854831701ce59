//! Roles and session identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::records::EntityKind;

/// The four account roles. Immutable once an account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Athlete,
    Trainer,
    Judge,
    Organizer,
}

impl Role {
    /// Credential lookup order used by authentication
    pub const ALL: [Role; 4] = [Role::Athlete, Role::Trainer, Role::Judge, Role::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Athlete => "athlete",
            Role::Trainer => "trainer",
            Role::Judge => "judge",
            Role::Organizer => "organizer",
        }
    }

    /// The entity whose rows are this role's accounts
    pub fn profile_entity(&self) -> EntityKind {
        match self {
            Role::Athlete => EntityKind::Athletes,
            Role::Trainer => EntityKind::Trainers,
            Role::Judge => EntityKind::Judges,
            Role::Organizer => EntityKind::Organizers,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "athlete" => Ok(Role::Athlete),
            "trainer" => Ok(Role::Trainer),
            "judge" => Ok(Role::Judge),
            "organizer" => Ok(Role::Organizer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// An authenticated session identity. `id` is the primary key of the caller's profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(id: i64, username: &str, role: Role) -> Self {
        Self {
            id,
            username: username.to_string(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!("athlete".parse::<Role>().unwrap(), Role::Athlete);
        assert_eq!(" Organizer ".parse::<Role>().unwrap(), Role::Organizer);
        assert_eq!("coach".parse::<Role>(), Err(UnknownRole("coach".to_string())));
    }

    #[test]
    fn test_display_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_profile_entities() {
        assert_eq!(Role::Athlete.profile_entity(), EntityKind::Athletes);
        assert_eq!(Role::Judge.profile_entity(), EntityKind::Judges);
    }

    #[test]
    fn test_identity_serializes_role_lowercase() {
        let identity = Identity::new(7, "anna", Role::Athlete);
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["role"], "athlete");
        assert_eq!(json["id"], 7);
    }
}
