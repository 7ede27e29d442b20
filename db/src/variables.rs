//! Variable persistence. Name uniqueness within a sequence is enforced
//! with a check-then-insert rather than relying on the UNIQUE constraint's
//! error shape, so callers get a typed [`DbError::Duplicate`].

use std::str::FromStr;

use promptgraph_core::model::{Variable, VariableType};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::{DbError, Result};
use crate::Pool;

#[derive(FromRow)]
struct VariableRow {
    id: i64,
    sequence_id: i64,
    name: String,
    var_type: String,
    payload_json: String,
    description: Option<String>,
}

fn row_to_variable(row: VariableRow) -> Result<Variable> {
    let var_type = VariableType::from_str(&row.var_type)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
    let payload: Value = serde_json::from_str(&row.payload_json)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;

    Ok(Variable {
        id: row.id,
        sequence_id: row.sequence_id,
        name: row.name,
        var_type,
        payload,
        description: row.description,
    })
}

const COLUMNS: &str = "id, sequence_id, name, var_type, payload_json, description";

pub async fn create(
    pool: &Pool,
    sequence_id: i64,
    name: &str,
    var_type: VariableType,
    payload: &Value,
    description: Option<&str>,
) -> Result<Variable> {
    if get_by_name_and_sequence(pool, name, sequence_id).await?.is_some() {
        return Err(DbError::Duplicate(format!(
            "variable with name '{name}' already exists in this sequence"
        )));
    }

    let payload_json = serde_json::to_string(payload).expect("Value always serializes");
    let row: VariableRow = sqlx::query_as(&format!(
        "INSERT INTO variables (sequence_id, name, var_type, payload_json, description) VALUES (?, ?, ?, ?, ?) \
         RETURNING {COLUMNS}"
    ))
    .bind(sequence_id)
    .bind(name)
    .bind(var_type.as_str())
    .bind(payload_json)
    .bind(description)
    .fetch_one(pool)
    .await?;

    row_to_variable(row)
}

pub async fn list_by_sequence(pool: &Pool, sequence_id: i64) -> Result<Vec<Variable>> {
    let rows: Vec<VariableRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM variables WHERE sequence_id = ? ORDER BY id"
    ))
    .bind(sequence_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_variable).collect()
}

pub async fn get_by_id_and_sequence(
    pool: &Pool,
    id: i64,
    sequence_id: i64,
) -> Result<Option<Variable>> {
    let row: Option<VariableRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM variables WHERE id = ? AND sequence_id = ?"
    ))
    .bind(id)
    .bind(sequence_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_variable).transpose()
}

/// Fetch a variable by id, scoped to the sequence owned by `owner_id` —
/// replaces the unscoped fetch-then-check-ownership pattern (DESIGN NOTE
/// "Owner-scoped queries") with a single owner-joined predicate.
pub async fn get_by_id_and_owner(pool: &Pool, id: i64, owner_id: i64) -> Result<Option<Variable>> {
    let row: Option<VariableRow> = sqlx::query_as(
        r#"SELECT v.id, v.sequence_id, v.name, v.var_type, v.payload_json, v.description
           FROM variables v
           JOIN sequences s ON s.id = v.sequence_id
           WHERE v.id = ? AND s.owner_id = ?"#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_variable).transpose()
}

pub async fn get_by_name_and_sequence(
    pool: &Pool,
    name: &str,
    sequence_id: i64,
) -> Result<Option<Variable>> {
    let row: Option<VariableRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM variables WHERE name = ? AND sequence_id = ?"
    ))
    .bind(name)
    .bind(sequence_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_variable).transpose()
}

pub async fn update(
    pool: &Pool,
    id: i64,
    sequence_id: i64,
    name: Option<&str>,
    payload: Option<&Value>,
    description: Option<Option<&str>>,
) -> Result<Option<Variable>> {
    if let Some(name) = name {
        if let Some(existing) = get_by_name_and_sequence(pool, name, sequence_id).await? {
            if existing.id != id {
                return Err(DbError::Duplicate(format!(
                    "variable with name '{name}' already exists in this sequence"
                )));
            }
        }
        sqlx::query("UPDATE variables SET name = ? WHERE id = ? AND sequence_id = ?")
            .bind(name)
            .bind(id)
            .bind(sequence_id)
            .execute(pool)
            .await?;
    }
    if let Some(payload) = payload {
        let payload_json = serde_json::to_string(payload).expect("Value always serializes");
        sqlx::query("UPDATE variables SET payload_json = ? WHERE id = ? AND sequence_id = ?")
            .bind(payload_json)
            .bind(id)
            .bind(sequence_id)
            .execute(pool)
            .await?;
    }
    if let Some(description) = description {
        sqlx::query("UPDATE variables SET description = ? WHERE id = ? AND sequence_id = ?")
            .bind(description)
            .bind(id)
            .bind(sequence_id)
            .execute(pool)
            .await?;
    }

    get_by_id_and_sequence(pool, id, sequence_id).await
}

pub async fn delete(pool: &Pool, id: i64, sequence_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM variables WHERE id = ? AND sequence_id = ?")
        .bind(id)
        .bind(sequence_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
