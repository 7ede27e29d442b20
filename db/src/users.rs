//! User persistence.

use promptgraph_core::model::User;
use sqlx::FromRow;

use crate::error::{DbError, Result};
use crate::Pool;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            hashed_password: row.hashed_password,
            is_active: row.is_active,
        }
    }
}

pub async fn create(pool: &Pool, email: &str, hashed_password: &str) -> Result<User> {
    if get_by_email(pool, email).await?.is_some() {
        return Err(DbError::Duplicate(format!(
            "user with email '{email}' already exists"
        )));
    }

    let row: UserRow = sqlx::query_as(
        "INSERT INTO users (email, hashed_password, is_active) VALUES (?, ?, 1) \
         RETURNING id, email, hashed_password, is_active",
    )
    .bind(email)
    .bind(hashed_password)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn get_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id, email, hashed_password, is_active FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(Into::into))
}

pub async fn get_by_id(pool: &Pool, id: i64) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id, email, hashed_password, is_active FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(Into::into))
}
