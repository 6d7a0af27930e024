use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::CoreError;

pub use sqlx::SqlitePool as DbPool;

/// Opens the local sheet store at `db_path`, creating the file and its
/// directory on first use, and brings the schema up to date.
///
/// Foreign keys are switched on per connection; project deletion relies on
/// them to cascade into tasks.
pub async fn establish_connection(db_path: &str) -> Result<SqlitePool, CoreError> {
    if let Some(dir) = Path::new(db_path).parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            tokio::fs::create_dir_all(dir).await?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    debug!(db_path, "applying sheet store migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
