//! Block persistence.

use promptgraph_core::model::{Block, BlockConfig, BlockType};
use sqlx::FromRow;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::Pool;

#[derive(FromRow)]
struct BlockRow {
    id: i64,
    sequence_id: i64,
    name: String,
    block_type: String,
    order: i64,
    config_json: String,
}

fn row_to_block(row: BlockRow) -> Result<Block> {
    let block_type = BlockType::from_str(&row.block_type)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
    let config: BlockConfig = serde_json::from_str(&row.config_json)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
    debug_assert_eq!(config.block_type(), block_type);

    Ok(Block {
        id: row.id,
        sequence_id: row.sequence_id,
        name: row.name,
        order: row.order,
        config,
    })
}

const COLUMNS: &str = r#"id, sequence_id, name, block_type, "order", config_json"#;

pub async fn create(
    pool: &Pool,
    sequence_id: i64,
    name: &str,
    order: i64,
    config: &BlockConfig,
) -> Result<Block> {
    let config_json = serde_json::to_string(config).expect("BlockConfig always serializes");
    let row: BlockRow = sqlx::query_as(&format!(
        r#"INSERT INTO blocks (sequence_id, name, block_type, "order", config_json)
           VALUES (?, ?, ?, ?, ?)
           RETURNING {COLUMNS}"#
    ))
    .bind(sequence_id)
    .bind(name)
    .bind(config.block_type().as_str())
    .bind(order)
    .bind(config_json)
    .fetch_one(pool)
    .await?;

    row_to_block(row)
}

/// Blocks for `sequence_id`, ordered `(order asc, id asc)`.
pub async fn list_by_sequence(pool: &Pool, sequence_id: i64) -> Result<Vec<Block>> {
    let rows: Vec<BlockRow> = sqlx::query_as(&format!(
        r#"SELECT {COLUMNS} FROM blocks WHERE sequence_id = ? ORDER BY "order" ASC, id ASC"#
    ))
    .bind(sequence_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_block).collect()
}

pub async fn get_by_id_and_sequence(
    pool: &Pool,
    id: i64,
    sequence_id: i64,
) -> Result<Option<Block>> {
    let row: Option<BlockRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM blocks WHERE id = ? AND sequence_id = ?"
    ))
    .bind(id)
    .bind(sequence_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_block).transpose()
}

/// Fetch a block by id, scoped to the sequence owned by `owner_id` —
/// replaces the unscoped fetch-then-check-ownership pattern (DESIGN NOTE
/// "Owner-scoped queries") with a single owner-joined predicate.
pub async fn get_by_id_and_owner(pool: &Pool, id: i64, owner_id: i64) -> Result<Option<Block>> {
    let row: Option<BlockRow> = sqlx::query_as(
        r#"SELECT b.id, b.sequence_id, b.name, b.block_type, b."order", b.config_json
           FROM blocks b
           JOIN sequences s ON s.id = b.sequence_id
           WHERE b.id = ? AND s.owner_id = ?"#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_block).transpose()
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &Pool,
    id: i64,
    sequence_id: i64,
    name: Option<&str>,
    order: Option<i64>,
    config: Option<&BlockConfig>,
) -> Result<Option<Block>> {
    if let Some(name) = name {
        sqlx::query(
            "UPDATE blocks SET name = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ? AND sequence_id = ?",
        )
        .bind(name)
        .bind(id)
        .bind(sequence_id)
        .execute(pool)
        .await?;
    }
    if let Some(order) = order {
        sqlx::query(
            r#"UPDATE blocks SET "order" = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ? AND sequence_id = ?"#,
        )
        .bind(order)
        .bind(id)
        .bind(sequence_id)
        .execute(pool)
        .await?;
    }
    if let Some(config) = config {
        let config_json = serde_json::to_string(config).expect("BlockConfig always serializes");
        sqlx::query(
            "UPDATE blocks SET block_type = ?, config_json = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ? AND sequence_id = ?",
        )
        .bind(config.block_type().as_str())
        .bind(config_json)
        .bind(id)
        .bind(sequence_id)
        .execute(pool)
        .await?;
    }

    get_by_id_and_sequence(pool, id, sequence_id).await
}

pub async fn delete(pool: &Pool, id: i64, sequence_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM blocks WHERE id = ? AND sequence_id = ?")
        .bind(id)
        .bind(sequence_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
