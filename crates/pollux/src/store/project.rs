use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use crate::entity::project::{ActiveModel, Column, Entity as Project, Model};

use super::errors::{Result, StoreError};

/// Return the project identified by `(platform, platform_project_id)`,
/// creating it with the given display fields if absent.
///
/// An existing row is returned as stored; its name and url are not touched
/// here. Compare with [`Model::metadata_differs`] and call
/// [`refresh_project_metadata`] once the surrounding batch has committed.
pub async fn resolve_or_create_project<C: ConnectionTrait>(
    db: &C,
    platform: &str,
    platform_project_id: i64,
    name: &str,
    url: &str,
) -> Result<Model> {
    let model = ActiveModel {
        name: Set(name.to_string()),
        url: Set(url.to_string()),
        platform: Set(platform.to_string()),
        platform_project_id: Set(platform_project_id),
        ..Default::default()
    };

    let inserted = Project::insert(model)
        .on_conflict(
            OnConflict::columns([Column::Platform, Column::PlatformProjectId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        tracing::debug!(
            platform = %platform,
            platform_project_id,
            name = %name,
            "Created project"
        );
    }

    find_by_platform_project_id(db, platform, platform_project_id)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            context: format!(
                "project platform={} platform_project_id={}",
                platform, platform_project_id
            ),
        })
}

/// Update a project's display name and url.
///
/// Returns `false` if the project no longer exists.
pub async fn refresh_project_metadata<C: ConnectionTrait>(
    db: &C,
    project_id: i64,
    name: &str,
    url: &str,
) -> Result<bool> {
    let Some(existing) = Project::find_by_id(project_id).one(db).await? else {
        return Ok(false);
    };

    if !existing.metadata_differs(name, url) {
        return Ok(true);
    }

    let mut model: ActiveModel = existing.into();
    model.name = Set(name.to_string());
    model.url = Set(url.to_string());
    model.update(db).await?;

    tracing::debug!(project_id, name = %name, "Refreshed project metadata");
    Ok(true)
}

/// Find a project by its platform-native identifier.
pub async fn find_by_platform_project_id<C: ConnectionTrait>(
    db: &C,
    platform: &str,
    platform_project_id: i64,
) -> Result<Option<Model>> {
    Project::find()
        .filter(Column::Platform.eq(platform))
        .filter(Column::PlatformProjectId.eq(platform_project_id))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Count projects owned by a platform.
pub async fn count_by_platform<C: ConnectionTrait>(db: &C, platform: &str) -> Result<u64> {
    Project::find()
        .filter(Column::Platform.eq(platform))
        .count(db)
        .await
        .map_err(StoreError::from)
}
