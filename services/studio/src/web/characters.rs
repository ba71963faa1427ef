//! services/studio/src/web/characters.rs
//!
//! Handlers for the characters of a novel.

use crate::web::dto::{
    CharacterContextParams, CharacterContextResponse, CharacterResponse, CreateCharacterRequest,
    UpdateCharacterRequest,
};
use crate::web::rest::{bad_request, port_error};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use novel_assistant_core::domain::{CharacterStatus, CharacterUpdate, NewCharacter, RoleType};
use std::str::FromStr;
use std::sync::Arc;

/// Parses an optional role or status label, rejecting unknown ones with 400.
fn parse_label<T: FromStr>(
    field: &str,
    value: Option<String>,
) -> Result<Option<T>, (StatusCode, String)>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| bad_request(format!("Invalid {}: {}", field, e)))
        })
        .transpose()
}

/// List the characters of a novel in creation order.
#[utoipa::path(
    get,
    path = "/novels/{id}/characters",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 200, description = "The roster", body = Vec<CharacterResponse>),
        (status = 404, description = "No such novel")
    )
)]
pub async fn list_characters(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.repos.novels.get(novel_id).await.map_err(port_error)?;
    let characters = app_state
        .repos
        .characters
        .list_by_novel(novel_id)
        .await
        .map_err(port_error)?;
    Ok(Json(
        characters.into_iter().map(CharacterResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/novels/{id}/characters",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = CreateCharacterRequest,
    responses(
        (status = 201, description = "Character created", body = CharacterResponse),
        (status = 400, description = "Unknown role or status label"),
        (status = 404, description = "No such novel"),
        (status = 409, description = "Duplicate name or foreign first-appearance chapter")
    )
)]
pub async fn create_character(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<CreateCharacterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let role_type = parse_label::<RoleType>("role_type", payload.role_type)?;
    let status = parse_label::<CharacterStatus>("status", payload.status)?;

    let character = app_state
        .repos
        .characters
        .create(NewCharacter {
            novel_id,
            name: payload.name,
            description: payload.description,
            characteristics: payload.characteristics,
            role_type: role_type.unwrap_or_default(),
            status: status.unwrap_or_default(),
            first_appearance: payload.first_appearance,
        })
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(CharacterResponse::from(character))))
}

#[utoipa::path(
    get,
    path = "/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    responses(
        (status = 200, description = "The character", body = CharacterResponse),
        (status = 404, description = "No such character")
    )
)]
pub async fn get_character(
    State(app_state): State<Arc<AppState>>,
    Path(character_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let character = app_state
        .repos
        .characters
        .get(character_id)
        .await
        .map_err(port_error)?;
    Ok(Json(CharacterResponse::from(character)))
}

/// Update a character. Any status may follow any other.
#[utoipa::path(
    patch,
    path = "/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    request_body = UpdateCharacterRequest,
    responses(
        (status = 200, description = "The updated character", body = CharacterResponse),
        (status = 400, description = "Unknown role or status label"),
        (status = 404, description = "No such character"),
        (status = 409, description = "Duplicate name or foreign first-appearance chapter")
    )
)]
pub async fn update_character(
    State(app_state): State<Arc<AppState>>,
    Path(character_id): Path<i64>,
    Json(payload): Json<UpdateCharacterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let update = CharacterUpdate {
        name: payload.name,
        description: payload.description,
        characteristics: payload.characteristics,
        role_type: parse_label("role_type", payload.role_type)?,
        status: parse_label("status", payload.status)?,
        first_appearance: payload.first_appearance,
    };
    let character = app_state
        .repos
        .characters
        .update(character_id, update)
        .await
        .map_err(port_error)?;
    Ok(Json(CharacterResponse::from(character)))
}

/// Delete a character together with every relationship it takes part in.
#[utoipa::path(
    delete,
    path = "/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    responses(
        (status = 204, description = "Character deleted"),
        (status = 404, description = "No such character")
    )
)]
pub async fn delete_character(
    State(app_state): State<Arc<AppState>>,
    Path(character_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .repos
        .characters
        .delete(character_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Profiles and relationships of the cast, optionally narrowed to one character.
#[utoipa::path(
    get,
    path = "/novels/{id}/character-context",
    params(("id" = i64, Path, description = "Novel id"), CharacterContextParams),
    responses(
        (status = 200, description = "The character context", body = CharacterContextResponse),
        (status = 404, description = "No such novel")
    )
)]
pub async fn character_context(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Query(params): Query<CharacterContextParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let context = app_state
        .orchestrator
        .assembler()
        .character_context(novel_id, params.name.as_deref())
        .await
        .map_err(port_error)?;
    Ok(Json(CharacterContextResponse::from(context)))
}
