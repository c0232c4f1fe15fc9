use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Create batches table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batches (
            batch_id TEXT PRIMARY KEY,
            batch_name TEXT NOT NULL,
            date_added TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create prompts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prompts (
            id TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            persona_id TEXT NOT NULL,
            category TEXT NOT NULL,
            intent_type TEXT NOT NULL,
            expected_visibility_score REAL NOT NULL,
            batch_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            FOREIGN KEY (batch_id) REFERENCES batches(batch_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create responses table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS responses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            response_text TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (prompt_id) REFERENCES prompts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_prompts_batch_id ON prompts(batch_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_prompts_status ON prompts(status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_responses_prompt_id ON responses(prompt_id)")
        .execute(pool)
        .await?;

    Ok(())
}
