//! Event entity - the base row shared by every event family.
//!
//! Family-specific attributes live in sibling extension tables that reuse the
//! event id as their primary key (currently only [`super::git_event`]).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Monotonically increasing id assigned at insertion.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// When the activity happened on the platform (not insertion time).
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Git family extension row (0 or 1).
    #[sea_orm(has_one = "super::git_event::Entity")]
    GitEvent,
}

impl Related<super::git_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GitEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
