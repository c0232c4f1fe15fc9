//! SQLite pool setup.
//!
//! Every `blens` command opens a short-lived pool against `[db] path` and
//! closes it before exiting. The database runs in WAL mode so an `analyze`
//! can read while an `import` writes, and foreign keys are enforced so a
//! response row cannot outlive its prompt.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

/// Open the prompt database, creating the file and any missing parent
/// directories on first use.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    if let Some(parent) = config.db.path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    // The CLI runs one command at a time; a small pool covers the
    // join-heavy analyze path.
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("blens.sqlite");
        let config: Config = toml::from_str(&format!(
            r#"
[db]
path = "{}"

[brand]
brand_name = "Natasha Denona"

[inputs]
personas_file = "personas.json"
keywords_file = "keywords.json"
"#,
            db_path.display()
        ))
        .unwrap();

        let pool = connect(&config).await.unwrap();
        pool.close().await;
        assert!(db_path.exists());
    }
}
