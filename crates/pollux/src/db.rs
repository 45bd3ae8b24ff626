//! Database connection utilities.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Configure SQLite-specific pragmas.
///
/// This sets:
/// - `foreign_keys=ON` - cascades from platforms to projects to git events
/// - `journal_mode=WAL` - readers don't block the per-platform writers
/// - `busy_timeout=5000` - concurrent platform commits wait instead of failing
/// - `synchronous=NORMAL` - durable at commit with WAL
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in [
        "PRAGMA foreign_keys=ON",
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
    ] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

fn connect_options(database_url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(database_url.to_string());
    // sqlx logs every statement at info otherwise
    options.sqlx_logging(false);
    options
}

/// Establish a connection pool to the event store.
///
/// For SQLite databases, this automatically enables foreign keys, WAL journal
/// mode, a 5 second busy timeout and NORMAL synchronous mode.
///
/// # Arguments
/// * `database_url` - Connection string (e.g., `sqlite:///path/to/pollux.db` or `postgres:///pollux`)
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(connect_options(database_url)).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection and run all pending migrations.
///
/// # Example
/// ```ignore
/// let db = pollux::connect_and_migrate("sqlite::memory:").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}
