use console::style;
use pollux::db;
use pollux::migration::{Migrator, MigratorTrait};
use pollux::store;

use crate::MigrateAction;
use crate::commands::shared::CliResult;

pub(crate) async fn handle_migrate(action: MigrateAction, database_url: &str) -> CliResult<()> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?;
            if pending.is_empty() {
                println!("Schema is up to date.");
                return Ok(());
            }
            for migration in &pending {
                println!("  {} {}", style("apply").cyan(), migration.name());
            }
            Migrator::up(&db, None).await?;
            println!("Applied {} migration(s).", pending.len());
        }
        MigrateAction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("Rolled back the last migration.");
        }
        MigrateAction::Status => {
            Migrator::status(&db).await?;
            let pending = Migrator::get_pending_migrations(&db).await?;
            if pending.is_empty() {
                let platforms = store::list_platforms(&db).await?.len();
                let events = store::count_git_events(&db).await?;
                println!(
                    "Schema is current: {} platform(s), {} event(s) stored.",
                    platforms, events
                );
            } else {
                println!(
                    "{} pending migration(s); run `pollux migrate up`.",
                    style(pending.len()).yellow()
                );
            }
        }
        MigrateAction::Fresh { yes } => {
            if !yes {
                return Err("`migrate fresh` drops the whole event log; pass --yes to confirm".into());
            }
            Migrator::fresh(&db).await?;
            println!("Recreated an empty schema.");
        }
    }

    Ok(())
}
