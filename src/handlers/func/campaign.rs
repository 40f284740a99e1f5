//! Campaign endpoints beyond the generic controller: member reads, the
//! caller's campaign list, and character roster management.
//!
//! The roster routes are guarded by `check_ownership::<Campaign>`, so the
//! handlers receive the already-authorized campaign via extension.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Extension;

use crate::database::models::{campaign, character, user, Campaign, Character};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::ownership::Owned;
use crate::middleware::response;
use crate::types::ObjectId;
use crate::AppState;

use super::serialize_all;

/// `GET /api/func/campaign/:id` — readable by the owner and every player.
pub async fn get_info(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ObjectId::parse(&id)?;
    let campaign = Repository::<Campaign>::new(state.pool.clone())
        .fetch(&id)
        .await?;

    if !campaign.is_member(&auth.id) {
        return Err(ApiError::forbidden(
            "Not authorized to access this resource",
        ));
    }

    Ok(response::record("campaign", &campaign))
}

/// `GET /api/func/my-campaigns` — the caller's `campaign_ids` expanded into
/// full records.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let user = user::find_by_id(&state.pool, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let campaigns = Repository::<Campaign>::new(state.pool.clone())
        .find_by_ids(&user.campaign_ids)
        .await?;

    Ok(response::list("campaign", serialize_all(&campaigns)))
}

/// `PUT /api/func/campaign/:id/character/:character_id` — add a character to
/// the roster. The character's owner joins the player list and gains the
/// campaign in their own campaign array.
pub async fn add_character(
    State(state): State<AppState>,
    Extension(Owned(target)): Extension<Owned<Campaign>>,
    Path((_, character_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let character_id = ObjectId::parse(&character_id)?;
    let character = Repository::<Character>::new(state.pool.clone())
        .fetch(&character_id)
        .await?;

    campaign::add_character(&state.pool, &target.id, &character_id).await?;
    character::set_campaign(&state.pool, &character_id, Some(&target.id)).await?;
    campaign::add_player(&state.pool, &target.id, &character.owner).await?;
    user::attach_to_collection(&state.pool, &character.owner, "campaign_ids", &target.id).await?;

    Ok(response::message("Character added to campaign successfully"))
}

/// `DELETE /api/func/campaign/:id/character/:character_id` — inverse of
/// [`add_character`].
pub async fn remove_character(
    State(state): State<AppState>,
    Extension(Owned(target)): Extension<Owned<Campaign>>,
    Path((_, character_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let character_id = ObjectId::parse(&character_id)?;
    let character = Repository::<Character>::new(state.pool.clone())
        .fetch(&character_id)
        .await?;

    campaign::remove_character(&state.pool, &target.id, &character_id).await?;
    character::set_campaign(&state.pool, &character_id, None).await?;
    campaign::remove_player(&state.pool, &target.id, &character.owner).await?;
    user::detach_from_collection(&state.pool, &character.owner, "campaign_ids", &target.id)
        .await?;

    Ok(response::message(
        "Character removed from campaign successfully",
    ))
}
