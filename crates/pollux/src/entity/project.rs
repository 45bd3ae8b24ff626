//! Project entity - a repository known on exactly one platform.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project model - unique per (platform, platform_project_id).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Surrogate primary key.
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name (e.g. "octocat/hello-world").
    pub name: String,
    /// Web URL of the project.
    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// Owning platform.
    pub platform: String,
    /// The platform's native identifier for this project.
    pub platform_project_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A project belongs to a platform.
    #[sea_orm(
        belongs_to = "super::platform::Entity",
        from = "Column::Platform",
        to = "super::platform::Column::Name",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Platform,
    /// A project is referenced by many git events.
    #[sea_orm(has_many = "super::git_event::Entity")]
    GitEvents,
}

impl Related<super::platform::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Platform.def()
    }
}

impl Related<super::git_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GitEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the stored display fields differ from freshly observed ones.
    pub fn metadata_differs(&self, name: &str, url: &str) -> bool {
        self.name != name || self.url != url
    }
}
