//! Generic CRUD controller.
//!
//! Each resource type implements [`Resource`], a compile-time description of
//! its table, owner column, filter whitelist, and payload types. The handler
//! functions below are instantiated per resource at route definition, so the
//! whole controller is monomorphized: no model registry, no dynamic property
//! access.

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Extension;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::config::config;
use crate::database::models::user;
use crate::database::Repository;
use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::auth::AuthUser;
use crate::middleware::response;
use crate::query::{ColumnKind, ListQuery};
use crate::types::ObjectId;
use crate::AppState;

/// A CRUD-managed record type.
///
/// `Draft` is the create payload; `Patch` is the update payload and carries no
/// owner field, so a client-supplied owner is dropped during deserialization
/// rather than checked afterwards.
#[async_trait]
pub trait Resource:
    Sized + Send + Sync + Unpin + Serialize + for<'r> FromRow<'r, PgRow> + 'static
{
    /// Singular resource name; also the envelope key (`data.<NAME>`).
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Column holding the owning user's id (`owner` or `creator`).
    const OWNER_COLUMN: Option<&'static str>;
    /// Back-reference array on the `users` table, for resources the user
    /// document tracks (characters, campaigns).
    const USER_COLLECTION: Option<&'static str>;
    /// Columns clients may filter and sort by, with their bind types.
    const FILTERABLE: &'static [(&'static str, ColumnKind)];
    /// Default `sort` parameter value; empty for unspecified order.
    const DEFAULT_SORT: &'static str = "";

    type Draft: DeserializeOwned + Send;
    type Patch: DeserializeOwned + Send;

    fn id(&self) -> &ObjectId;
    fn owner(&self) -> Option<&ObjectId>;

    /// Insert a new record, stamping the caller as owner/creator.
    async fn insert(pool: &PgPool, draft: Self::Draft, caller: &ObjectId)
        -> Result<Self, ApiError>;

    /// Apply a partial update to an existing record.
    async fn apply_update(pool: &PgPool, id: &ObjectId, patch: Self::Patch)
        -> Result<(), ApiError>;

    /// Delete the record and detach its user back-reference in one
    /// transaction; either both happen or neither does.
    async fn delete(pool: &PgPool, record: &Self, caller: &ObjectId) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::TABLE);
        sqlx::query(&sql).bind(record.id()).execute(&mut *tx).await?;
        if let Some(column) = Self::USER_COLLECTION {
            user::detach_from_collection(&mut *tx, caller, column, record.id()).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// `POST /api/func/<resource>` — 201 with the created record.
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let payload = extract_payload::<R>(body)?;
    let draft: R::Draft = serde_json::from_value(payload)
        .map_err(|e| ApiError::validation(format!("Invalid {} data: {}", R::NAME, e)))?;

    let record = R::insert(&state.pool, draft, &auth.id).await?;

    if let Some(column) = R::USER_COLLECTION {
        user::attach_to_collection(&state.pool, &auth.id, column, record.id()).await?;
    }

    Ok(response::created(R::NAME, &record))
}

/// `GET /api/func/<resource>` — filtered, sorted, paginated list scoped to
/// the caller when an owner column is configured.
pub async fn get_all<R: Resource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let mut query = ListQuery::parse(
        &pairs,
        R::FILTERABLE,
        R::DEFAULT_SORT,
        config().api.default_page_size,
    )?;

    // Owner scoping is structural: the filter is rewritten before any SQL
    // runs, so a caller-supplied owner filter cannot widen the result set.
    if let Some(column) = R::OWNER_COLUMN {
        query.force_eq(column, auth.id.as_str());
    }

    let repo = Repository::<R>::new(state.pool.clone());

    if query.page_requested {
        let total = repo.count(&query).await?;
        if query.offset() >= total {
            return Err(ApiError::not_found("This page does not exist"));
        }
    }

    let rows = repo.list(&query).await?;
    let items = rows
        .iter()
        .map(|row| {
            project(
                serde_json::to_value(row).unwrap_or(Value::Null),
                query.fields.as_deref(),
            )
        })
        .collect();

    Ok(response::list(R::NAME, items))
}

/// `GET /api/func/<resource>/:id` — 404 if absent, 403 unless the caller
/// owns the record.
pub async fn get_by_id<R: Resource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let record = Repository::<R>::new(state.pool.clone()).fetch(&id).await?;
    authorize_owner(&record, &auth, "access")?;
    Ok(response::record(R::NAME, &record))
}

/// `PUT /api/func/<resource>/:id` — authorize against the stored record
/// first, then apply the patch and respond with the re-read record.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let payload = extract_payload::<R>(body)?;
    if payload.as_object().map_or(true, |map| map.is_empty()) {
        return Err(ApiError::validation("Update data is required"));
    }

    let repo = Repository::<R>::new(state.pool.clone());
    let existing = repo.fetch(&id).await?;
    authorize_owner(&existing, &auth, "update")?;

    let patch: R::Patch = serde_json::from_value(payload)
        .map_err(|e| ApiError::validation(format!("Invalid {} data: {}", R::NAME, e)))?;
    R::apply_update(&state.pool, &id, patch).await?;

    let updated = repo.fetch(&id).await?;
    Ok(response::record(R::NAME, &updated))
}

/// `DELETE /api/func/<resource>/:id` — 204 on success.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let record = Repository::<R>::new(state.pool.clone()).fetch(&id).await?;
    authorize_owner(&record, &auth, "delete")?;
    R::delete(&state.pool, &record, &auth.id).await?;
    Ok(response::no_content())
}

/// Accept either `{<name>: {..}}` or the bare record object.
fn extract_payload<R: Resource>(body: Value) -> Result<Value, ApiError> {
    let payload = match body.get(R::NAME) {
        Some(inner) => inner.clone(),
        None => body,
    };
    if payload.is_null() {
        return Err(ApiError::validation(format!("{} data is required", R::NAME)));
    }
    Ok(payload)
}

pub fn authorize_owner<R: Resource>(
    record: &R,
    auth: &AuthUser,
    action: &str,
) -> Result<(), ApiError> {
    if let Some(owner) = record.owner() {
        if owner != &auth.id {
            return Err(ApiError::forbidden(format!(
                "Not authorized to {} this resource",
                action
            )));
        }
    }
    Ok(())
}

/// Field projection (`?fields=a,b`). The id always survives projection.
fn project(value: Value, fields: Option<&[String]>) -> Value {
    let Some(fields) = fields else { return value };
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projection_keeps_id_and_requested_fields() {
        let value = json!({"id": "abc", "name": "Tava", "level": 3, "owner": "xyz"});
        let fields = vec!["name".to_string()];
        let projected = project(value, Some(&fields));
        assert_eq!(projected, json!({"id": "abc", "name": "Tava"}));
    }

    #[test]
    fn no_fields_means_no_projection() {
        let value = json!({"id": "abc", "name": "Tava"});
        assert_eq!(project(value.clone(), None), value);
    }
}
