use serde::{Deserialize, Serialize};

/// Status value an import may write onto a record but never erase.
pub const COMPLETED_STATUS: &str = "completed";

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// The entity families an import run can target. One run targets one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Job,
    Office,
    Contact,
}

impl Family {
    /// All families, in the order the dashboard lists them.
    pub const ALL: [Family; 3] = [Family::Job, Family::Office, Family::Contact];
}

impl std::str::FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job" => Ok(Self::Job),
            "office" => Ok(Self::Office),
            "contact" => Ok(Self::Contact),
            other => Err(format!("unknown entity family: '{other}'")),
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Job => write!(f, "job"),
            Self::Office => write!(f, "office"),
            Self::Contact => write!(f, "contact"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

/// Parse and comparison discipline for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Amount,
    Date,
    Flag,
}

/// Who is allowed to write a field.
///
/// Import-owned fields track the upstream source. User-owned fields belong
/// to humans once set: an import may fill them while still at their default,
/// never overwrite them after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOwner {
    Import,
    User,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub owner: FieldOwner,
}

const fn import(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, owner: FieldOwner::Import }
}

const fn user(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, owner: FieldOwner::User }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Static description of one family's reconciliation-relevant fields.
#[derive(Debug)]
pub struct FamilySchema {
    pub family: Family,
    /// Fields forming the composite natural key, normalized before compare.
    pub key_fields: [&'static str; 2],
    /// Numeric field used by the fuzzy match strategy, if the family has one.
    pub value_field: Option<&'static str>,
    /// Status field subject to the monotonic `completed` rule, if any.
    pub status_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

static JOB: FamilySchema = FamilySchema {
    family: Family::Job,
    key_fields: ["name", "address"],
    value_field: Some("value"),
    status_field: Some("status"),
    fields: &[
        import("name", FieldKind::Text),
        import("address", FieldKind::Text),
        import("value", FieldKind::Amount),
        import("contractor", FieldKind::Text),
        import("bid_date", FieldKind::Date),
        import("type", FieldKind::Text),
        import("status", FieldKind::Text),
        user("viewed", FieldKind::Flag),
        user("notes", FieldKind::Text),
        user("favorite", FieldKind::Flag),
        user("temperature", FieldKind::Text),
    ],
};

static OFFICE: FamilySchema = FamilySchema {
    family: Family::Office,
    key_fields: ["name", "address"],
    value_field: None,
    status_field: None,
    fields: &[
        import("name", FieldKind::Text),
        import("address", FieldKind::Text),
        import("phone", FieldKind::Text),
        import("region", FieldKind::Text),
        user("notes", FieldKind::Text),
        user("favorite", FieldKind::Flag),
    ],
};

static CONTACT: FamilySchema = FamilySchema {
    family: Family::Contact,
    key_fields: ["name", "company"],
    value_field: None,
    status_field: None,
    fields: &[
        import("name", FieldKind::Text),
        import("company", FieldKind::Text),
        import("title", FieldKind::Text),
        import("phone", FieldKind::Text),
        import("email", FieldKind::Text),
        user("viewed", FieldKind::Flag),
        user("notes", FieldKind::Text),
        user("favorite", FieldKind::Flag),
        user("temperature", FieldKind::Text),
    ],
};

impl FamilySchema {
    pub fn of(family: Family) -> &'static FamilySchema {
        match family {
            Family::Job => &JOB,
            Family::Office => &OFFICE,
            Family::Contact => &CONTACT,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_user_owned(&self, name: &str) -> bool {
        matches!(self.field(name), Some(spec) if spec.owner == FieldOwner::User)
    }
}
