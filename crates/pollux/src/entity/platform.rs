//! Platform entity - a source-control hosting service acting as an event source.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform model - one row per registered hosting platform.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platforms")]
pub struct Model {
    /// Unique platform name (e.g. "github", "gitlab").
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// Timestamp up to which activity has been durably ingested.
    /// `None` means the platform was never synchronized.
    pub last_sync: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A platform owns many projects.
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this platform has completed at least one cycle.
    pub fn has_synced(&self) -> bool {
        self.last_sync.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_has_synced() {
        let mut model = Model {
            name: "github".to_string(),
            last_sync: None,
        };
        assert!(!model.has_synced());

        model.last_sync = Some(Utc::now().fixed_offset());
        assert!(model.has_synced());
    }
}
