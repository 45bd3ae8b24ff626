use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use crate::entity::action::{ActiveModel, Column, Entity as Action, Model};

use super::errors::{Result, StoreError};

/// Normalize a raw action label: trimmed and lowercased.
///
/// Returns `None` for labels that are empty after trimming.
pub fn canonical_action_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Return the id of the action called `name`, creating it if unseen.
///
/// Concurrent callers racing on the same name observe the same id: the insert
/// is conflict-tolerant and the id is always read back afterwards.
pub async fn resolve_or_create_action<C: ConnectionTrait>(db: &C, name: &str) -> Result<i64> {
    let name = canonical_action_name(name)
        .ok_or_else(|| StoreError::invalid_input("action name must not be empty"))?;

    let model = ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    };

    let inserted = Action::insert(model)
        .on_conflict(OnConflict::column(Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        tracing::debug!(action = %name, "Created action");
    }

    find_by_name(db, &name)
        .await?
        .map(|action| action.id)
        .ok_or_else(|| StoreError::NotFound {
            context: format!("action={}", name),
        })
}

/// Find an action by its canonical name.
pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>> {
    Action::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Count all known actions.
pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64> {
    Action::find().count(db).await.map_err(StoreError::from)
}
