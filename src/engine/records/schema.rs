//! Entity Schema Descriptors
//!
//! Every CRUD table is described as data: its id column, editable fields with
//! their input types, and the foreign-key lookups resolved when listing. The
//! repository is generic over these descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The record types the application manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Athletes,
    Trainers,
    Judges,
    Medals,
    Organizers,
    Venues,
    Inventories,
}

impl EntityKind {
    /// Screen order
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Athletes,
        EntityKind::Trainers,
        EntityKind::Judges,
        EntityKind::Medals,
        EntityKind::Organizers,
        EntityKind::Venues,
        EntityKind::Inventories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Athletes => "athletes",
            EntityKind::Trainers => "trainers",
            EntityKind::Judges => "judges",
            EntityKind::Medals => "medals",
            EntityKind::Organizers => "organizers",
            EntityKind::Venues => "venues",
            EntityKind::Inventories => "inventories",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            EntityKind::Inventories => "inventory",
            other => other.as_str().trim_end_matches('s'),
        }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            EntityKind::Athletes => &ATHLETES,
            EntityKind::Trainers => &TRAINERS,
            EntityKind::Judges => &JUDGES,
            EntityKind::Medals => &MEDALS,
            EntityKind::Organizers => &ORGANIZERS,
            EntityKind::Venues => &VENUES,
            EntityKind::Inventories => &INVENTORIES,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                name == kind.as_str() || name == kind.singular() || name == kind.schema().table
            })
            .ok_or_else(|| format!("unknown entity: {}", s))
    }
}

/// How a submitted form value is interpreted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    /// Free text, stored as given
    Text,
    /// One of a fixed option list
    Choice(&'static [&'static str]),
    /// Calendar date, stored as ISO `YYYY-MM-DD`
    Date,
    /// Required non-negative decimal
    Real,
    /// Required non-negative integer
    Integer,
    /// Optional id of a row in another entity
    ForeignKey(EntityKind),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub field_type: FieldType,
}

/// LEFT JOIN that resolves a foreign key to a display label
#[derive(Debug, Clone, Copy)]
pub struct LookupJoin {
    /// Output column name
    pub alias: &'static str,
    pub fk_column: &'static str,
    pub target: EntityKind,
    pub table_alias: &'static str,
    /// SQL expression over `table_alias`
    pub expression: &'static str,
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub title: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub fields: &'static [FieldSpec],
    pub lookups: &'static [LookupJoin],
    pub read_only: bool,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names a listing returns, in order, after `id`
    pub fn output_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|f| f.name)
            .chain(self.lookups.iter().map(|l| l.alias))
            .collect()
    }
}

pub const GENDERS: &[&str] = &["", "M", "F"];
pub const SPORT_TYPES: &[&str] = &["Football", "Hockey", "Basketball", "Swimming", "Other"];
pub const TRAINER_CATEGORIES: &[&str] = &["1st category", "2nd category", "Highest category"];
pub const JUDGE_CATEGORIES: &[&str] = &["National", "International", "Chief judge"];
pub const MEDAL_MATERIALS: &[&str] = &["Gold", "Silver", "Bronze", "Other"];

const fn field(name: &'static str, label: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        label,
        field_type,
    }
}

static ATHLETES: EntitySchema = EntitySchema {
    kind: EntityKind::Athletes,
    title: "Athletes",
    table: "athletes",
    id_column: "id_athlete",
    fields: &[
        field("firstname", "First name", FieldType::Text),
        field("lastname", "Last name", FieldType::Text),
        field("gender", "Gender", FieldType::Choice(GENDERS)),
        field("phone_number", "Phone", FieldType::Text),
        field("birth_date", "Birth date", FieldType::Date),
        field("sport_rank", "Rank", FieldType::Text),
        field("sport_type", "Sport", FieldType::Text),
    ],
    lookups: &[],
    read_only: false,
};

static TRAINERS: EntitySchema = EntitySchema {
    kind: EntityKind::Trainers,
    title: "Trainers",
    table: "trainers",
    id_column: "id_trainer",
    fields: &[
        field("firstname", "First name", FieldType::Text),
        field("lastname", "Last name", FieldType::Text),
        field("phone_number", "Phone", FieldType::Text),
        field("sport_type", "Sport", FieldType::Choice(SPORT_TYPES)),
        field("category", "Category", FieldType::Choice(TRAINER_CATEGORIES)),
        field("birth_date", "Birth date", FieldType::Date),
    ],
    lookups: &[],
    read_only: false,
};

static JUDGES: EntitySchema = EntitySchema {
    kind: EntityKind::Judges,
    title: "Judges",
    table: "judges",
    id_column: "id_judge",
    fields: &[
        field("firstname", "First name", FieldType::Text),
        field("lastname", "Last name", FieldType::Text),
        field("phone_number", "Phone", FieldType::Text),
        field("category", "Category", FieldType::Choice(JUDGE_CATEGORIES)),
        field("birth_date", "Birth date", FieldType::Date),
        field("id_athlete", "Athlete ID", FieldType::ForeignKey(EntityKind::Athletes)),
        field("id_medal", "Medal ID", FieldType::ForeignKey(EntityKind::Medals)),
    ],
    lookups: &[
        LookupJoin {
            alias: "athlete",
            fk_column: "id_athlete",
            target: EntityKind::Athletes,
            table_alias: "a",
            expression: "a.firstname || ' ' || a.lastname",
        },
        LookupJoin {
            alias: "medal",
            fk_column: "id_medal",
            target: EntityKind::Medals,
            table_alias: "m",
            expression: "m.material || ' (' || m.color || ')'",
        },
    ],
    read_only: false,
};

static MEDALS: EntitySchema = EntitySchema {
    kind: EntityKind::Medals,
    title: "Medals",
    table: "medals",
    id_column: "id_medal",
    fields: &[
        field("material", "Material", FieldType::Choice(MEDAL_MATERIALS)),
        field("color", "Color", FieldType::Text),
        field("weight", "Weight", FieldType::Real),
        field("quantity", "Quantity", FieldType::Integer),
    ],
    lookups: &[],
    read_only: false,
};

static ORGANIZERS: EntitySchema = EntitySchema {
    kind: EntityKind::Organizers,
    title: "Organizers",
    table: "organizers",
    id_column: "id_organizer",
    fields: &[
        field("firstname", "First name", FieldType::Text),
        field("lastname", "Last name", FieldType::Text),
        field("phone_number", "Phone", FieldType::Text),
        field("email", "Email", FieldType::Text),
        field("birth_date", "Birth date", FieldType::Date),
        field("id_venue", "Venue ID", FieldType::ForeignKey(EntityKind::Venues)),
        field("id_inventory", "Inventory ID", FieldType::ForeignKey(EntityKind::Inventories)),
    ],
    lookups: &[
        LookupJoin {
            alias: "venue",
            fk_column: "id_venue",
            target: EntityKind::Venues,
            table_alias: "v",
            expression: "v.name",
        },
        LookupJoin {
            alias: "inventory",
            fk_column: "id_inventory",
            target: EntityKind::Inventories,
            table_alias: "i",
            expression: "i.product_name",
        },
    ],
    read_only: false,
};

static VENUES: EntitySchema = EntitySchema {
    kind: EntityKind::Venues,
    title: "Venues",
    table: "venues",
    id_column: "id_venue",
    fields: &[field("name", "Name", FieldType::Text)],
    lookups: &[],
    read_only: true,
};

static INVENTORIES: EntitySchema = EntitySchema {
    kind: EntityKind::Inventories,
    title: "Sports inventory",
    table: "sports_inventories",
    id_column: "id_inventory",
    fields: &[field("product_name", "Product", FieldType::Text)],
    lookups: &[],
    read_only: true,
};
