use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict, Query},
};

use crate::entity::event::{Column as EventColumn, Entity as Event};
use crate::entity::git_event::{Column as GitEventColumn, Entity as GitEvent};
use crate::entity::platform::{ActiveModel, Column, Entity as Platform, Model};
use crate::entity::project::{Column as ProjectColumn, Entity as Project};

use super::errors::{Result, StoreError};

/// List all registered platforms with their current checkpoint, ordered by name.
pub async fn list_platforms<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Platform::find()
        .order_by_asc(Column::Name)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Find a platform by name.
pub async fn find_platform<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>> {
    Platform::find_by_id(name.to_string())
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Register a platform with an empty checkpoint.
///
/// Registering an already known platform is a no-op and leaves its checkpoint
/// untouched. Returns `true` if the platform was newly created.
pub async fn register_platform<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::invalid_input("platform name must not be empty"));
    }

    let model = ActiveModel {
        name: Set(name.to_string()),
        last_sync: Set(None),
    };

    let inserted = Platform::insert(model)
        .on_conflict(OnConflict::column(Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        tracing::info!(platform = %name, "Registered platform");
    }

    Ok(inserted > 0)
}

/// Move a platform's checkpoint forward to `new_last_sync`.
///
/// The checkpoint is non-decreasing: an earlier timestamp than the stored one
/// fails with [`StoreError::CheckpointRegression`] and leaves the row as is.
/// Pass a transaction to commit the checkpoint together with other writes.
pub async fn advance_checkpoint<C: ConnectionTrait>(
    db: &C,
    name: &str,
    new_last_sync: DateTime<Utc>,
) -> Result<Model> {
    let current = find_platform(db, name)
        .await?
        .ok_or_else(|| StoreError::platform_not_found(name))?;

    if let Some(last_sync) = current.last_sync {
        let last_sync = last_sync.with_timezone(&Utc);
        if new_last_sync < last_sync {
            return Err(StoreError::CheckpointRegression {
                platform: name.to_string(),
                current: last_sync,
                attempted: new_last_sync,
            });
        }
    }

    let mut model: ActiveModel = current.into();
    model.last_sync = Set(Some(new_last_sync.fixed_offset()));
    let updated = model.update(db).await?;

    tracing::debug!(platform = %name, checkpoint = %new_last_sync, "Advanced checkpoint");
    Ok(updated)
}

/// Delete a platform together with its projects, their git events and the
/// underlying base events.
///
/// Projects and git events go via `ON DELETE CASCADE`; base events are removed
/// explicitly first since an extension row cannot cascade to its parent.
/// Returns the number of platform rows deleted (0 or 1).
pub async fn delete_platform<C: TransactionTrait>(db: &C, name: &str) -> Result<u64> {
    let txn = db.begin().await?;

    let platform_event_ids = Query::select()
        .column((GitEvent, GitEventColumn::Id))
        .from(GitEvent)
        .inner_join(
            Project,
            Expr::col((Project, ProjectColumn::Id)).equals((GitEvent, GitEventColumn::ProjectId)),
        )
        .and_where(Expr::col((Project, ProjectColumn::Platform)).eq(name))
        .to_owned();

    let events = Event::delete_many()
        .filter(EventColumn::Id.in_subquery(platform_event_ids))
        .exec(&txn)
        .await?;

    let platforms = Platform::delete_by_id(name.to_string()).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        platform = %name,
        events = events.rows_affected,
        "Deleted platform"
    );
    Ok(platforms.rows_affected)
}
