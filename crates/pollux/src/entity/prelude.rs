//! Common re-exports for convenient entity usage.

pub use super::action::{
    ActiveModel as ActionActiveModel, Column as ActionColumn, Entity as Action,
    Model as ActionModel,
};
pub use super::event::{
    ActiveModel as EventActiveModel, Column as EventColumn, Entity as Event, Model as EventModel,
};
pub use super::git_event::{
    ActiveModel as GitEventActiveModel, Column as GitEventColumn, Entity as GitEvent,
    Model as GitEventModel,
};
pub use super::platform::{
    ActiveModel as PlatformActiveModel, Column as PlatformColumn, Entity as Platform,
    Model as PlatformModel,
};
pub use super::project::{
    ActiveModel as ProjectActiveModel, Column as ProjectColumn, Entity as Project,
    Model as ProjectModel,
};
