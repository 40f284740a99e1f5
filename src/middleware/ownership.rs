//! Route-level ownership checks.
//!
//! `validate_object_id` rejects malformed ids before any database work;
//! `check_ownership::<R>` fetches the record named by the `id` path
//! parameter, authorizes the caller, and attaches the record for downstream
//! handlers.

use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::controller::{authorize_owner, Resource};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::types::ObjectId;
use crate::AppState;

/// A record fetched and authorized by [`check_ownership`], available to the
/// handler via `Extension<Owned<R>>`.
pub struct Owned<R>(pub Arc<R>);

impl<R> Clone for Owned<R> {
    fn clone(&self) -> Self {
        Owned(self.0.clone())
    }
}

/// Reject any path parameter that is not a well-formed 24-hex id.
/// Purely syntactic; runs before any lookup.
pub async fn validate_object_id(
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    for (name, value) in params.iter() {
        if !ObjectId::is_valid(value) {
            return Err(ApiError::validation(format!("Invalid {} format", name)));
        }
    }
    Ok(next.run(request).await)
}

/// Fetch the record at `:id`, 404 if missing, 403 unless the caller owns it.
pub async fn check_ownership<R: Resource>(
    State(state): State<AppState>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = params
        .iter()
        .find(|(name, _)| *name == "id")
        .map(|(_, value)| value)
        .ok_or_else(|| ApiError::validation("id is required"))?;
    let id = ObjectId::parse(id)?;

    let auth = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::authentication_required("Authentication required"))?;

    let record = Repository::<R>::new(state.pool.clone()).fetch(&id).await?;
    authorize_owner(&record, &auth, "access")?;

    request.extensions_mut().insert(Owned(Arc::new(record)));
    Ok(next.run(request).await)
}
