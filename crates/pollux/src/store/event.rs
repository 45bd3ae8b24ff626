use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entity::action::Column as ActionColumn;
use crate::entity::event::{self, Column as EventColumn, Entity as Event};
use crate::entity::git_event::{self, Column as GitEventColumn, Entity as GitEvent};
use crate::entity::project::Column as ProjectColumn;

use super::errors::{Result, StoreError};

/// A stored event read back together with its family extension.
///
/// Each event family adds a variant backed by its own extension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum EventRecord {
    Git(GitEventRecord),
}

impl EventRecord {
    /// Base event id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Git(record) => record.id,
        }
    }

    /// When the activity happened on the platform.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Git(record) => record.timestamp,
        }
    }
}

/// Git family event joined with its project and action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitEventRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
    pub project_id: i64,
    pub project_name: String,
    pub action: String,
}

#[derive(Debug, FromQueryResult)]
struct GitEventRow {
    id: i64,
    timestamp: sea_orm::prelude::DateTimeWithTimeZone,
    platform: String,
    project_id: i64,
    project_name: String,
    action: String,
}

impl From<GitEventRow> for GitEventRecord {
    fn from(row: GitEventRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.timestamp.with_timezone(&Utc),
            platform: row.platform,
            project_id: row.project_id,
            project_name: row.project_name,
            action: row.action,
        }
    }
}

/// Append a git event: a base `events` row plus its `git_events` extension
/// sharing the same id.
///
/// Both rows are written in one transaction, which becomes a savepoint when
/// `db` is already a transaction. Returns the new event id.
pub async fn append_git_event<C: TransactionTrait>(
    db: &C,
    timestamp: DateTime<Utc>,
    project_id: i64,
    action_id: i64,
) -> Result<i64> {
    let txn = db.begin().await?;

    let event = event::ActiveModel {
        timestamp: Set(timestamp.fixed_offset()),
        ..Default::default()
    };
    let event_id = Event::insert(event).exec(&txn).await?.last_insert_id;

    let git_event = git_event::ActiveModel {
        id: Set(event_id),
        project_id: Set(project_id),
        action_id: Set(action_id),
    };
    GitEvent::insert(git_event)
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;
    Ok(event_id)
}

/// Count base event rows.
pub async fn count_events<C: ConnectionTrait>(db: &C) -> Result<u64> {
    Event::find().count(db).await.map_err(StoreError::from)
}

/// Count git extension rows.
pub async fn count_git_events<C: ConnectionTrait>(db: &C) -> Result<u64> {
    GitEvent::find().count(db).await.map_err(StoreError::from)
}

/// List git events ordered by id, optionally restricted to one platform.
pub async fn list_git_events<C: ConnectionTrait>(
    db: &C,
    platform: Option<&str>,
) -> Result<Vec<EventRecord>> {
    let mut query = GitEvent::find()
        .select_only()
        .column_as(GitEventColumn::Id, "id")
        .column_as(EventColumn::Timestamp, "timestamp")
        .column_as(ProjectColumn::Platform, "platform")
        .column_as(GitEventColumn::ProjectId, "project_id")
        .column_as(ProjectColumn::Name, "project_name")
        .column_as(ActionColumn::Name, "action")
        .join(JoinType::InnerJoin, git_event::Relation::Event.def())
        .join(JoinType::InnerJoin, git_event::Relation::Project.def())
        .join(JoinType::InnerJoin, git_event::Relation::Action.def());

    if let Some(platform) = platform {
        query = query.filter(ProjectColumn::Platform.eq(platform));
    }

    let rows = query
        .order_by_asc(GitEventColumn::Id)
        .into_model::<GitEventRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| EventRecord::Git(row.into()))
        .collect())
}
