use chrono::Utc;
use console::style;
use pollux::store;

use crate::PlatformsAction;
use crate::commands::shared::CliResult;

pub(crate) async fn handle_platforms(action: PlatformsAction, database_url: &str) -> CliResult<()> {
    let db = pollux::connect_and_migrate(database_url).await?;

    match action {
        PlatformsAction::List => {
            let platforms = store::list_platforms(&db).await?;
            if platforms.is_empty() {
                println!("No platforms registered.");
                return Ok(());
            }

            println!(
                "{}",
                style(format!("{:<16} {:>8}  {}", "PLATFORM", "PROJECTS", "LAST SYNC")).bold()
            );
            for platform in platforms {
                let projects = store::project::count_by_platform(&db, &platform.name).await?;
                let last_sync = platform
                    .last_sync
                    .map(|t| t.with_timezone(&Utc).to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!("{:<16} {:>8}  {}", platform.name, projects, last_sync);
            }
        }
        PlatformsAction::Register { name } => {
            if store::register_platform(&db, &name).await? {
                println!("Registered platform {}.", name);
            } else {
                println!("Platform {} is already registered.", name);
            }
        }
        PlatformsAction::Remove { name, yes } => {
            if !yes {
                return Err(format!(
                    "Removing '{}' deletes all of its projects and events; pass --yes to confirm",
                    name
                )
                .into());
            }
            if store::delete_platform(&db, &name).await? > 0 {
                println!("Removed platform {} and its events.", name);
            } else {
                println!("Platform {} is not registered.", name);
            }
        }
    }

    Ok(())
}
