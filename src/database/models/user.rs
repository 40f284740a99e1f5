//! User accounts.
//!
//! Not a CRUD resource: users are managed only through the auth endpoints.
//! `character_ids` / `campaign_ids` are back-references maintained by the
//! generic controller when those resources are created or deleted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::ApiError;
use crate::types::ObjectId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Session id of the one currently valid token, if any.
    #[serde(skip_serializing)]
    pub active_session: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub character_ids: Vec<ObjectId>,
    pub campaign_ids: Vec<ObjectId>,
}

/// Insert a new account with its first session already active.
/// A duplicate username or email maps to a 400 Conflict.
pub async fn insert(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    session_id: &str,
) -> Result<User, ApiError> {
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, email, password_hash, active_session, last_login)
         VALUES ($1, $2, $3, $4, $5, NOW())
         RETURNING *",
    )
    .bind(ObjectId::new())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(session_id)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(ApiError::conflict("Email or username already in use"))
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn find_by_id(pool: &PgPool, id: &ObjectId) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Store a fresh session id and touch `last_login`. Every token issued under
/// the previous session id becomes stale the moment this commits.
pub async fn rotate_session(
    pool: &PgPool,
    id: &ObjectId,
    session_id: &str,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET active_session = $1, last_login = NOW() WHERE id = $2")
        .bind(session_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_session(pool: &PgPool, id: &ObjectId) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET active_session = NULL WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete an account together with everything it owns, scrubbing every
/// cross-reference in the same transaction: other users' characters lose
/// references to the deleted campaigns, other users' campaign arrays drop
/// the dead campaign ids, and surviving campaigns drop the deleted user
/// from their player and character rosters. Returns false when no such
/// user exists.
pub async fn delete(pool: &PgPool, id: &ObjectId) -> Result<bool, ApiError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE characters SET campaign = NULL
         WHERE campaign IN (SELECT id FROM campaigns WHERE owner = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // Dead campaign ids disappear from every member's campaign array.
    sqlx::query(
        "UPDATE users SET campaign_ids = (
             SELECT COALESCE(array_agg(cid), '{}')
             FROM unnest(campaign_ids) AS cid
             WHERE cid NOT IN (SELECT id FROM campaigns WHERE owner = $1)
         )
         WHERE campaign_ids && ARRAY(SELECT id FROM campaigns WHERE owner = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    // Dead character ids disappear from surviving campaigns' rosters.
    sqlx::query(
        "UPDATE campaigns SET character_ids = (
             SELECT COALESCE(array_agg(cid), '{}')
             FROM unnest(character_ids) AS cid
             WHERE cid NOT IN (SELECT id FROM characters WHERE owner = $1)
         )
         WHERE character_ids && ARRAY(SELECT id FROM characters WHERE owner = $1)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE campaigns SET player_ids = array_remove(player_ids, $1)
         WHERE player_ids @> ARRAY[$1]",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM characters WHERE owner = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM campaigns WHERE owner = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}

/// Append an id to one of the user's collection arrays; already-present ids
/// are left alone, so the operation is idempotent.
pub async fn attach_to_collection<'e>(
    executor: impl PgExecutor<'e>,
    user_id: &ObjectId,
    column: &str,
    id: &ObjectId,
) -> Result<(), ApiError> {
    let column = collection_column(column)?;
    let sql = format!(
        "UPDATE users SET {col} = array_append({col}, $1)
         WHERE id = $2 AND NOT ({col} @> ARRAY[$1])",
        col = column
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn detach_from_collection<'e>(
    executor: impl PgExecutor<'e>,
    user_id: &ObjectId,
    column: &str,
    id: &ObjectId,
) -> Result<(), ApiError> {
    let column = collection_column(column)?;
    let sql = format!(
        "UPDATE users SET {col} = array_remove({col}, $1) WHERE id = $2",
        col = column
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

// Collection columns are interpolated as identifiers, so only the two known
// arrays are accepted.
fn collection_column(column: &str) -> Result<&'static str, ApiError> {
    match column {
        "character_ids" => Ok("character_ids"),
        "campaign_ids" => Ok("campaign_ids"),
        other => Err(ApiError::internal(format!(
            "unknown user collection column: {other}"
        ))),
    }
}
