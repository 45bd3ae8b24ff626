//! Action entity - canonical activity labels shared by all platforms.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Canonical action name (e.g. "push", "merge_request.opened").
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::git_event::Entity")]
    GitEvents,
}

impl Related<super::git_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GitEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
