//! Commit phase of a sync cycle.
//!
//! The batch, its projects and actions, and the checkpoint are written in a
//! single transaction on a spawned task. Dropping the cycle future while the
//! commit runs does not abort it: the task finishes with a commit or a
//! rollback, records the batch's dedup keys and acknowledges the fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;

use crate::platform::EventSource;
use crate::store::{
    self, advance_checkpoint, append_git_event, refresh_project_metadata,
    resolve_or_create_action, resolve_or_create_project,
};

use super::errors::SyncError;
use super::normalize::{CommittedKeys, NormalizedActivity};

/// Everything the commit task needs, owned.
pub(crate) struct CommitTask {
    pub db: Arc<DatabaseConnection>,
    pub source: Arc<dyn EventSource>,
    pub platform: String,
    pub items: Vec<NormalizedActivity>,
    pub checkpoint: DateTime<Utc>,
    pub etag: Option<String>,
    pub committed: Arc<Mutex<CommittedKeys>>,
    /// Holds the platform's cycle slot until the task is done.
    pub flight: Arc<OwnedMutexGuard<()>>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitOutcome {
    pub inserted: usize,
    pub checkpoint: DateTime<Utc>,
    pub projects_refreshed: usize,
}

/// Project display fields observed in the batch that differ from the store.
struct StaleMetadata {
    project_id: i64,
    name: String,
    url: String,
}

struct BatchWrite {
    inserted: usize,
    checkpoint: DateTime<Utc>,
    stale: Vec<StaleMetadata>,
}

pub(crate) fn spawn_commit_task(task: CommitTask) -> JoinHandle<store::Result<CommitOutcome>> {
    tokio::spawn(run_commit_task(task))
}

async fn run_commit_task(task: CommitTask) -> store::Result<CommitOutcome> {
    let CommitTask {
        db,
        source,
        platform,
        items,
        checkpoint,
        etag,
        committed,
        flight,
    } = task;

    let written = commit_batch(&db, &platform, &items, checkpoint).await?;

    committed
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remember(&items, written.checkpoint);
    source.acknowledge(etag.as_deref());

    let projects_refreshed = refresh_stale_metadata(&db, &platform, &written.stale).await;

    drop(flight);
    Ok(CommitOutcome {
        inserted: written.inserted,
        checkpoint: written.checkpoint,
        projects_refreshed,
    })
}

/// Wait for the commit task, turning a panic into a [`SyncError`].
pub(crate) async fn await_commit_task(
    handle: JoinHandle<store::Result<CommitOutcome>>,
) -> Result<CommitOutcome, SyncError> {
    match handle.await {
        Ok(result) => Ok(result?),
        Err(e) => {
            let message = if e.is_panic() {
                let panic_payload = e.into_panic();
                if let Some(s) = panic_payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                }
            } else if e.is_cancelled() {
                "Task was cancelled".to_string()
            } else {
                format!("Task failed: {}", e)
            };

            tracing::error!(message = %message, "Commit task failed");
            Err(SyncError::CommitTask { message })
        }
    }
}

async fn commit_batch(
    db: &DatabaseConnection,
    platform: &str,
    items: &[NormalizedActivity],
    checkpoint: DateTime<Utc>,
) -> store::Result<BatchWrite> {
    let txn = db.begin().await?;

    match write_batch(&txn, platform, items, checkpoint).await {
        Ok(written) => {
            txn.commit().await?;
            tracing::debug!(
                platform = %platform,
                inserted = written.inserted,
                checkpoint = %written.checkpoint,
                "Committed batch"
            );
            Ok(written)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(platform = %platform, "Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn write_batch(
    txn: &DatabaseTransaction,
    platform: &str,
    items: &[NormalizedActivity],
    checkpoint: DateTime<Utc>,
) -> store::Result<BatchWrite> {
    let mut projects: HashMap<i64, crate::entity::project::Model> = HashMap::new();
    let mut actions: HashMap<&str, i64> = HashMap::new();
    // Latest observation per project wins; items are in ascending order.
    let mut stale: HashMap<i64, StaleMetadata> = HashMap::new();

    for item in items {
        let native_id = item.key.native_project_id;
        let project = match projects.get(&native_id) {
            Some(project) => project.clone(),
            None => {
                let project = resolve_or_create_project(
                    txn,
                    platform,
                    native_id,
                    &item.project_name,
                    &item.project_url,
                )
                .await?;
                projects.insert(native_id, project.clone());
                project
            }
        };

        if project.metadata_differs(&item.project_name, &item.project_url) {
            stale.insert(
                project.id,
                StaleMetadata {
                    project_id: project.id,
                    name: item.project_name.clone(),
                    url: item.project_url.clone(),
                },
            );
        } else {
            stale.remove(&project.id);
        }

        let action_id = match actions.get(item.action.as_str()) {
            Some(id) => *id,
            None => {
                let id = resolve_or_create_action(txn, &item.action).await?;
                actions.insert(&item.action, id);
                id
            }
        };

        append_git_event(txn, item.timestamp, project.id, action_id).await?;
    }

    advance_checkpoint(txn, platform, checkpoint).await?;

    Ok(BatchWrite {
        inserted: items.len(),
        checkpoint,
        stale: stale.into_values().collect(),
    })
}

/// Best-effort update of project names and urls; failures are only logged.
async fn refresh_stale_metadata(
    db: &DatabaseConnection,
    platform: &str,
    stale: &[StaleMetadata],
) -> usize {
    let mut refreshed = 0;
    for entry in stale {
        match refresh_project_metadata(db, entry.project_id, &entry.name, &entry.url).await {
            Ok(true) => refreshed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(
                platform = %platform,
                project_id = entry.project_id,
                "Failed to refresh project metadata: {}",
                e
            ),
        }
    }
    refreshed
}
