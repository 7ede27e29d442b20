//! Sequence persistence. Every read that accepts a caller-submitted id is
//! scoped by `owner_id` in the query predicate itself (DESIGN NOTE
//! "Owner-scoped queries") rather than fetched first and checked after.

use chrono::{DateTime, Utc};
use promptgraph_core::model::Sequence;
use sqlx::FromRow;

use crate::error::Result;
use crate::Pool;

#[derive(FromRow)]
struct SequenceRow {
    id: i64,
    owner_id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SequenceRow> for Sequence {
    fn from(row: SequenceRow) -> Self {
        Sequence {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

pub async fn create(
    pool: &Pool,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Sequence> {
    let row: SequenceRow = sqlx::query_as(&format!(
        "INSERT INTO sequences (owner_id, name, description) VALUES (?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn list_by_owner(pool: &Pool, owner_id: i64) -> Result<Vec<Sequence>> {
    let rows: Vec<SequenceRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM sequences WHERE owner_id = ? ORDER BY id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_by_id_and_owner(pool: &Pool, id: i64, owner_id: i64) -> Result<Option<Sequence>> {
    let row: Option<SequenceRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM sequences WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

pub async fn update(
    pool: &Pool,
    id: i64,
    owner_id: i64,
    name: Option<&str>,
    description: Option<Option<&str>>,
) -> Result<Option<Sequence>> {
    if let Some(name) = name {
        sqlx::query("UPDATE sequences SET name = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ? AND owner_id = ?")
            .bind(name)
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
    }
    if let Some(description) = description {
        sqlx::query("UPDATE sequences SET description = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ? AND owner_id = ?")
            .bind(description)
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
    }

    get_by_id_and_owner(pool, id, owner_id).await
}

pub async fn delete(pool: &Pool, id: i64, owner_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sequences WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
