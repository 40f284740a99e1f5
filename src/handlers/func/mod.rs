//! Resource routes under `/api/func`.
//!
//! Most resources get the generic controller verbatim via [`crud_routes`].
//! Characters and campaigns differ: their single-record reads extend to
//! campaign co-members, they have list-expansion endpoints over the caller's
//! id arrays, and campaigns carry the add/remove-character relationship
//! routes.

pub mod campaign;
pub mod character;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use serde_json::Value;

use crate::controller::{self, Resource};
use crate::database::models::{Campaign, Character, Class, Feature, Item, Race, Spell, Subclass};
use crate::middleware::ownership::{check_ownership, validate_object_id};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Expansion of the caller's own collections.
        .route("/characters", get(character::list_mine))
        .route("/my-campaigns", get(campaign::list_mine))
        // Characters: co-member read replaces the generic get_by_id.
        .route(
            "/character",
            post(controller::create::<Character>).get(controller::get_all::<Character>),
        )
        .route(
            "/character/:id",
            get(character::get_info)
                .put(controller::update::<Character>)
                .delete(controller::delete::<Character>)
                .layer(from_fn(validate_object_id)),
        )
        // Campaigns, including the character-roster relationship routes.
        .route(
            "/campaign",
            post(controller::create::<Campaign>).get(controller::get_all::<Campaign>),
        )
        .route(
            "/campaign/:id",
            get(campaign::get_info)
                .put(controller::update::<Campaign>)
                .delete(controller::delete::<Campaign>)
                .layer(from_fn(validate_object_id)),
        )
        .route(
            "/campaign/:id/character/:character_id",
            put(campaign::add_character)
                .delete(campaign::remove_character)
                .layer(from_fn_with_state(
                    state.clone(),
                    check_ownership::<Campaign>,
                ))
                .layer(from_fn(validate_object_id)),
        )
        // Reference data: the generic controller end to end.
        .merge(crud_routes::<Class>())
        .merge(crud_routes::<Race>())
        .merge(crud_routes::<Spell>())
        .merge(crud_routes::<Item>())
        .merge(crud_routes::<Feature>())
        .merge(crud_routes::<Subclass>())
}

fn crud_routes<R: Resource>() -> Router<AppState> {
    let collection = format!("/{}", R::NAME);
    let item = format!("/{}/:id", R::NAME);
    Router::new()
        .route(
            &collection,
            post(controller::create::<R>).get(controller::get_all::<R>),
        )
        .route(
            &item,
            get(controller::get_by_id::<R>)
                .put(controller::update::<R>)
                .delete(controller::delete::<R>)
                .layer(from_fn(validate_object_id)),
        )
}

pub(crate) fn serialize_all<T: Serialize>(rows: &[T]) -> Vec<Value> {
    rows.iter()
        .map(|row| serde_json::to_value(row).unwrap_or(Value::Null))
        .collect()
}
