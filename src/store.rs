//! SQLite persistence for prompts, batches, and imported responses.
//!
//! All functions take a connected pool; callers own connect/close. Rows
//! map to the model types by hand, with status strings validated on read.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::{Batch, BatchStatus, Prompt, PromptStatus, ResponseRecord};

/// A response joined with its prompt's segmentation fields, as consumed by
/// the analysis pipeline.
#[derive(Debug, Clone)]
pub struct ResponseJoin {
    pub prompt_id: String,
    pub persona_id: String,
    pub category: String,
    pub intent_type: String,
    pub platform: String,
    pub response_text: String,
}

pub async fn insert_batch(pool: &SqlitePool, batch: &Batch) -> Result<()> {
    sqlx::query(
        "INSERT INTO batches (batch_id, batch_name, date_added, status, notes) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&batch.batch_id)
    .bind(&batch.batch_name)
    .bind(batch.date_added.to_rfc3339())
    .bind(batch.status.as_str())
    .bind(&batch.notes)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_batches(pool: &SqlitePool) -> Result<Vec<Batch>> {
    let rows = sqlx::query(
        "SELECT batch_id, batch_name, date_added, status, notes FROM batches ORDER BY date_added DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(batch_from_row).collect()
}

/// Set a batch's status. Returns false when the batch does not exist.
pub async fn set_batch_status(
    pool: &SqlitePool,
    batch_id: &str,
    status: BatchStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE batches SET status = ? WHERE batch_id = ?")
        .bind(status.as_str())
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_prompts(pool: &SqlitePool, prompts: &[Prompt]) -> Result<()> {
    for prompt in prompts {
        sqlx::query(
            r#"
            INSERT INTO prompts
                (id, text, persona_id, category, intent_type,
                 expected_visibility_score, batch_id, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&prompt.id)
        .bind(&prompt.text)
        .bind(&prompt.persona_id)
        .bind(&prompt.category)
        .bind(&prompt.intent_type)
        .bind(prompt.expected_visibility_score)
        .bind(&prompt.batch_id)
        .bind(prompt.status.as_str())
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// List prompts, optionally filtered by batch and/or review status.
pub async fn list_prompts(
    pool: &SqlitePool,
    batch_id: Option<&str>,
    status: Option<PromptStatus>,
) -> Result<Vec<Prompt>> {
    let mut sql = String::from(
        "SELECT id, text, persona_id, category, intent_type, \
         expected_visibility_score, batch_id, status FROM prompts WHERE 1=1",
    );
    if batch_id.is_some() {
        sql.push_str(" AND batch_id = ?");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY id ASC");

    let mut query = sqlx::query(&sql);
    if let Some(batch_id) = batch_id {
        query = query.bind(batch_id);
    }
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(prompt_from_row).collect()
}

/// All stored prompt texts, used to seed the similarity index so a new
/// generation run dedups against prior batches.
pub async fn all_prompt_texts(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT text FROM prompts")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get("text")).collect())
}

/// Set one prompt's review status. Returns false when the id is unknown.
pub async fn set_prompt_status(
    pool: &SqlitePool,
    prompt_id: &str,
    status: PromptStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE prompts SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(prompt_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Move every pending prompt in a batch to the given status. Returns the
/// number of prompts updated.
pub async fn set_pending_status_for_batch(
    pool: &SqlitePool,
    batch_id: &str,
    status: PromptStatus,
) -> Result<u64> {
    let result = sqlx::query("UPDATE prompts SET status = ? WHERE batch_id = ? AND status = 'pending'")
        .bind(status.as_str())
        .bind(batch_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert_responses(pool: &SqlitePool, responses: &[ResponseRecord]) -> Result<()> {
    for response in responses {
        sqlx::query(
            "INSERT INTO responses (prompt_id, platform, response_text, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&response.prompt_id)
        .bind(&response.platform)
        .bind(&response.response_text)
        .bind(response.timestamp.to_rfc3339())
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Responses joined with their prompts' segmentation fields. Responses
/// whose prompt id is unknown are skipped by the inner join.
pub async fn load_responses_joined(pool: &SqlitePool) -> Result<Vec<ResponseJoin>> {
    let rows = sqlx::query(
        r#"
        SELECT r.prompt_id, p.persona_id, p.category, p.intent_type,
               r.platform, r.response_text
        FROM responses r
        JOIN prompts p ON p.id = r.prompt_id
        ORDER BY r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ResponseJoin {
            prompt_id: row.get("prompt_id"),
            persona_id: row.get("persona_id"),
            category: row.get("category"),
            intent_type: row.get("intent_type"),
            platform: row.get("platform"),
            response_text: row.get("response_text"),
        })
        .collect())
}

/// Prompt counts per review status, for the stats command.
pub async fn count_prompts_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM prompts GROUP BY status ORDER BY status")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get("status"), row.get("n")))
        .collect())
}

/// Prompt and response counts per batch, newest batch first.
pub async fn count_per_batch(pool: &SqlitePool) -> Result<Vec<(String, i64, i64)>> {
    let rows = sqlx::query(
        r#"
        SELECT b.batch_id,
               (SELECT COUNT(*) FROM prompts p WHERE p.batch_id = b.batch_id) AS prompt_count,
               (SELECT COUNT(*) FROM responses r
                JOIN prompts p ON p.id = r.prompt_id
                WHERE p.batch_id = b.batch_id) AS response_count
        FROM batches b
        ORDER BY b.date_added DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .map(|row| {
            (
                row.get("batch_id"),
                row.get("prompt_count"),
                row.get("response_count"),
            )
        })
        .collect())
}

pub async fn count_responses(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn prompt_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Prompt> {
    let status: String = row.get("status");
    Ok(Prompt {
        id: row.get("id"),
        text: row.get("text"),
        persona_id: row.get("persona_id"),
        category: row.get("category"),
        intent_type: row.get("intent_type"),
        expected_visibility_score: row.get("expected_visibility_score"),
        batch_id: row.get("batch_id"),
        status: PromptStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown prompt status: {}", status))?,
    })
}

fn batch_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Batch> {
    let status: String = row.get("status");
    let date_added: String = row.get("date_added");
    Ok(Batch {
        batch_id: row.get("batch_id"),
        batch_name: row.get("batch_name"),
        date_added: DateTime::parse_from_rfc3339(&date_added)
            .map_err(|e| anyhow!("invalid batch timestamp '{}': {}", date_added, e))?
            .with_timezone(&Utc),
        status: BatchStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown batch status: {}", status))?,
        notes: row.get::<Option<String>, _>("notes").unwrap_or_default(),
    })
}
