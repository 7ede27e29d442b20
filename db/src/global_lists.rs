//! GlobalList and GlobalListItem persistence: per-item CRUD with
//! caller-assignable `order`, append-to-end when omitted.

use promptgraph_core::model::{GlobalList, GlobalListItem};
use sqlx::FromRow;

use crate::error::{DbError, Result};
use crate::Pool;

#[derive(FromRow)]
struct GlobalListRow {
    id: i64,
    owner_id: i64,
    name: String,
    description: Option<String>,
}

#[derive(FromRow)]
struct GlobalListItemRow {
    id: i64,
    global_list_id: i64,
    value: String,
    order: i64,
}

impl From<GlobalListItemRow> for GlobalListItem {
    fn from(row: GlobalListItemRow) -> Self {
        GlobalListItem {
            id: row.id,
            global_list_id: row.global_list_id,
            value: row.value,
            order: row.order,
        }
    }
}

const LIST_COLUMNS: &str = "id, owner_id, name, description";
const ITEM_COLUMNS: &str = r#"id, global_list_id, value, "order""#;

async fn items_for_list(pool: &Pool, global_list_id: i64) -> Result<Vec<GlobalListItem>> {
    let rows: Vec<GlobalListItemRow> = sqlx::query_as(&format!(
        r#"SELECT {ITEM_COLUMNS} FROM global_list_items WHERE global_list_id = ? ORDER BY "order" ASC, id ASC"#
    ))
    .bind(global_list_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

async fn row_to_list(pool: &Pool, row: GlobalListRow) -> Result<GlobalList> {
    let items = items_for_list(pool, row.id).await?;
    Ok(GlobalList {
        id: row.id,
        owner_id: row.owner_id,
        name: row.name,
        description: row.description,
        items,
    })
}

pub async fn create(
    pool: &Pool,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<GlobalList> {
    if get_by_name_and_owner(pool, name, owner_id).await?.is_some() {
        return Err(DbError::Duplicate(format!(
            "global list with name '{name}' already exists"
        )));
    }

    let row: GlobalListRow = sqlx::query_as(&format!(
        "INSERT INTO global_lists (owner_id, name, description) VALUES (?, ?, ?) \
         RETURNING {LIST_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    row_to_list(pool, row).await
}

pub async fn list_by_owner(pool: &Pool, owner_id: i64) -> Result<Vec<GlobalList>> {
    let rows: Vec<GlobalListRow> = sqlx::query_as(&format!(
        "SELECT {LIST_COLUMNS} FROM global_lists WHERE owner_id = ? ORDER BY id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    let mut lists = Vec::with_capacity(rows.len());
    for row in rows {
        lists.push(row_to_list(pool, row).await?);
    }
    Ok(lists)
}

pub async fn get_by_id_and_owner(pool: &Pool, id: i64, owner_id: i64) -> Result<Option<GlobalList>> {
    let row: Option<GlobalListRow> = sqlx::query_as(&format!(
        "SELECT {LIST_COLUMNS} FROM global_lists WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_list(pool, row).await?)),
        None => Ok(None),
    }
}

async fn get_by_name_and_owner(pool: &Pool, name: &str, owner_id: i64) -> Result<Option<GlobalList>> {
    let row: Option<GlobalListRow> = sqlx::query_as(&format!(
        "SELECT {LIST_COLUMNS} FROM global_lists WHERE name = ? AND owner_id = ?"
    ))
    .bind(name)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_list(pool, row).await?)),
        None => Ok(None),
    }
}

pub async fn update(
    pool: &Pool,
    id: i64,
    owner_id: i64,
    name: Option<&str>,
    description: Option<Option<&str>>,
) -> Result<Option<GlobalList>> {
    if let Some(name) = name {
        sqlx::query("UPDATE global_lists SET name = ? WHERE id = ? AND owner_id = ?")
            .bind(name)
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
    }
    if let Some(description) = description {
        sqlx::query("UPDATE global_lists SET description = ? WHERE id = ? AND owner_id = ?")
            .bind(description)
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
    }

    get_by_id_and_owner(pool, id, owner_id).await
}

pub async fn delete(pool: &Pool, id: i64, owner_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM global_lists WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Append (or insert at a caller-assigned `order`) an item to `global_list_id`.
pub async fn add_item(
    pool: &Pool,
    global_list_id: i64,
    value: &str,
    order: Option<i64>,
) -> Result<GlobalListItem> {
    let order = match order {
        Some(order) => order,
        None => {
            let max: Option<i64> =
                sqlx::query_scalar(r#"SELECT MAX("order") FROM global_list_items WHERE global_list_id = ?"#)
                    .bind(global_list_id)
                    .fetch_one(pool)
                    .await?;
            max.map(|m| m + 1).unwrap_or(0)
        }
    };

    let row: GlobalListItemRow = sqlx::query_as(&format!(
        r#"INSERT INTO global_list_items (global_list_id, value, "order") VALUES (?, ?, ?)
           RETURNING {ITEM_COLUMNS}"#
    ))
    .bind(global_list_id)
    .bind(value)
    .bind(order)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn get_item(pool: &Pool, item_id: i64, global_list_id: i64) -> Result<Option<GlobalListItem>> {
    let row: Option<GlobalListItemRow> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM global_list_items WHERE id = ? AND global_list_id = ?"
    ))
    .bind(item_id)
    .bind(global_list_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

pub async fn update_item(
    pool: &Pool,
    item_id: i64,
    global_list_id: i64,
    value: Option<&str>,
    order: Option<i64>,
) -> Result<Option<GlobalListItem>> {
    if let Some(value) = value {
        sqlx::query("UPDATE global_list_items SET value = ? WHERE id = ? AND global_list_id = ?")
            .bind(value)
            .bind(item_id)
            .bind(global_list_id)
            .execute(pool)
            .await?;
    }
    if let Some(order) = order {
        sqlx::query(r#"UPDATE global_list_items SET "order" = ? WHERE id = ? AND global_list_id = ?"#)
            .bind(order)
            .bind(item_id)
            .bind(global_list_id)
            .execute(pool)
            .await?;
    }

    get_item(pool, item_id, global_list_id).await
}

pub async fn remove_item(pool: &Pool, item_id: i64, global_list_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM global_list_items WHERE id = ? AND global_list_id = ?")
        .bind(item_id)
        .bind(global_list_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
