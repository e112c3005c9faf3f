use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transaction, reminder, or category scope belongs to exactly one user or
/// one group, never both.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OwnerId {
    User(Uuid),
    Group(Uuid),
}

impl OwnerId {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            OwnerId::User(id) => Some(*id),
            OwnerId::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            OwnerId::User(_) => None,
            OwnerId::Group(id) => Some(*id),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, OwnerId::Group(_))
    }
}
