//! services/studio/src/web/relationships.rs
//!
//! Handlers for character relationships and the relationship-type catalog.

use crate::web::dto::{
    CharacterRelationshipResponse, CreateRelationshipRequest, NovelRelationshipResponse,
    RelationshipResponse, RelationshipTypeResponse, UpdateRelationshipRequest,
};
use crate::web::rest::{bad_request, port_error};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use novel_assistant_core::domain::{NewRelationship, RelationshipUpdate};
use std::sync::Arc;

/// Every relationship of a novel with endpoint names resolved.
#[utoipa::path(
    get,
    path = "/novels/{id}/relationships",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 200, description = "The relationships", body = Vec<NovelRelationshipResponse>),
        (status = 404, description = "No such novel")
    )
)]
pub async fn list_novel_relationships(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.repos.novels.get(novel_id).await.map_err(port_error)?;
    let relationships = app_state
        .repos
        .relationships
        .list_by_novel(novel_id)
        .await
        .map_err(port_error)?;
    Ok(Json(
        relationships
            .into_iter()
            .map(NovelRelationshipResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/novels/{id}/relationships",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = CreateRelationshipRequest,
    responses(
        (status = 201, description = "Relationship created", body = RelationshipResponse),
        (status = 400, description = "Empty relationship type"),
        (status = 404, description = "An endpoint does not exist"),
        (status = 409, description = "Same endpoints, foreign characters or foreign start chapter")
    )
)]
pub async fn create_relationship(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<CreateRelationshipRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.relationship_type.trim().is_empty() {
        return Err(bad_request("relationship_type must not be empty"));
    }
    let relationship = app_state
        .repos
        .relationships
        .create(NewRelationship {
            novel_id,
            character1_id: payload.character1_id,
            character2_id: payload.character2_id,
            relationship_type: payload.relationship_type,
            description: payload.description,
            start_chapter: payload.start_chapter,
        })
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(RelationshipResponse::from(relationship))))
}

/// The relationships of one character, with that character always in the `self` position.
#[utoipa::path(
    get,
    path = "/characters/{id}/relationships",
    params(("id" = i64, Path, description = "Character id")),
    responses(
        (status = 200, description = "The relationships", body = Vec<CharacterRelationshipResponse>),
        (status = 404, description = "No such character")
    )
)]
pub async fn list_character_relationships(
    State(app_state): State<Arc<AppState>>,
    Path(character_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let relationships = app_state
        .repos
        .relationships
        .list_for_character(character_id)
        .await
        .map_err(port_error)?;
    Ok(Json(
        relationships
            .into_iter()
            .map(CharacterRelationshipResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    patch,
    path = "/relationships/{id}",
    params(("id" = i64, Path, description = "Relationship id")),
    request_body = UpdateRelationshipRequest,
    responses(
        (status = 200, description = "The updated relationship", body = RelationshipResponse),
        (status = 404, description = "No such relationship"),
        (status = 409, description = "Foreign start chapter")
    )
)]
pub async fn update_relationship(
    State(app_state): State<Arc<AppState>>,
    Path(relationship_id): Path<i64>,
    Json(payload): Json<UpdateRelationshipRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if matches!(&payload.relationship_type, Some(kind) if kind.trim().is_empty()) {
        return Err(bad_request("relationship_type must not be empty"));
    }
    let relationship = app_state
        .repos
        .relationships
        .update(
            relationship_id,
            RelationshipUpdate {
                relationship_type: payload.relationship_type,
                description: payload.description,
                start_chapter: payload.start_chapter,
            },
        )
        .await
        .map_err(port_error)?;
    Ok(Json(RelationshipResponse::from(relationship)))
}

#[utoipa::path(
    delete,
    path = "/relationships/{id}",
    params(("id" = i64, Path, description = "Relationship id")),
    responses(
        (status = 204, description = "Relationship deleted"),
        (status = 404, description = "No such relationship")
    )
)]
pub async fn delete_relationship(
    State(app_state): State<Arc<AppState>>,
    Path(relationship_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .repos
        .relationships
        .delete(relationship_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The predefined relationship types, grouped by category.
#[utoipa::path(
    get,
    path = "/relationship-types",
    responses(
        (status = 200, description = "The catalog", body = Vec<RelationshipTypeResponse>)
    )
)]
pub async fn relationship_types(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = app_state
        .repos
        .relationships
        .relationship_types()
        .await
        .map_err(port_error)?;
    Ok(Json(
        entries
            .into_iter()
            .map(RelationshipTypeResponse::from)
            .collect::<Vec<_>>(),
    ))
}
