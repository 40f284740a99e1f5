//! Character endpoints beyond the generic controller.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Extension;

use crate::database::models::{user, Campaign, Character};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response;
use crate::types::ObjectId;
use crate::AppState;

use super::serialize_all;

/// `GET /api/func/character/:id` — readable by the owner, and by members of
/// the campaign the character is attached to.
pub async fn get_info(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let character = Repository::<Character>::new(state.pool.clone())
        .fetch(&id)
        .await?;

    if character.owner != auth.id && !co_member(&state, &character, &auth.id).await? {
        return Err(ApiError::forbidden(
            "Not authorized to access this resource",
        ));
    }

    Ok(response::record("character", &character))
}

async fn co_member(
    state: &AppState,
    character: &Character,
    user_id: &ObjectId,
) -> Result<bool, ApiError> {
    let Some(campaign_id) = &character.campaign else {
        return Ok(false);
    };
    let campaign = Repository::<Campaign>::new(state.pool.clone())
        .find_by_id(campaign_id)
        .await?;
    Ok(campaign.is_some_and(|c| c.is_member(user_id)))
}

/// `GET /api/func/characters` — the caller's `character_ids` expanded into
/// full records.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let user = user::find_by_id(&state.pool, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let characters = Repository::<Character>::new(state.pool.clone())
        .find_by_ids(&user.character_ids)
        .await?;

    Ok(response::list("character", serialize_all(&characters)))
}
