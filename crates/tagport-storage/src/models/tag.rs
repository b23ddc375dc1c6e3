use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tagport_reader::AssignTarget;

/// RFID tag known to the backend.
///
/// A tag is bound to at most one partner or one vehicle. Only `active`
/// tags count as in use; any other status can be reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,

    /// Tag identifier as read by the reader
    pub uid: String,

    /// Raw status column. Use [`Tag::status`] for the typed value.
    pub status: String,

    pub partner_id: Option<i64>,
    pub vehicle_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Typed status. `None` for a value outside the schema's check list.
    pub fn status(&self) -> Option<TagStatus> {
        TagStatus::parse(&self.status)
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(TagStatus::Active)
    }

    /// Record this tag is bound to. A partner binding wins over a vehicle
    /// binding when both are set.
    pub fn owner(&self) -> Option<AssignTarget> {
        self.partner_id
            .map(AssignTarget::Partner)
            .or(self.vehicle_id.map(AssignTarget::Vehicle))
    }
}

/// Lifecycle status of a tag.
///
/// ```
/// use tagport_storage::models::TagStatus;
///
/// assert_eq!(TagStatus::parse("lost"), Some(TagStatus::Lost));
/// assert_eq!(TagStatus::Active.as_str(), "active");
/// assert_eq!(TagStatus::parse("stolen"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Active,
    Inactive,
    Pending,
    Lost,
}

impl TagStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Person a tag can be issued to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    /// Tag currently issued to this partner
    pub tag_id: Option<i64>,
}

/// Vehicle a tag can be mounted on.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub plate: String,
    /// Tag currently mounted on this vehicle
    pub tag_id: Option<i64>,
}
