//! services/studio/src/web/rest.rs
//!
//! The OpenAPI document, the router wiring every REST endpoint, and the
//! mapping from port errors to HTTP statuses.

use crate::web::{chapters, characters, dto::*, generation, novels, relationships};
use crate::web::state::AppState;
use axum::{
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use novel_assistant_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        novels::list_novels,
        novels::create_novel,
        novels::get_novel,
        novels::update_novel,
        novels::delete_novel,
        novels::novel_context,
        chapters::list_chapters,
        chapters::create_chapter,
        chapters::get_chapter,
        chapters::update_chapter,
        chapters::delete_chapter,
        chapters::select_chapter,
        chapters::list_versions,
        chapters::restore_version,
        characters::list_characters,
        characters::create_character,
        characters::get_character,
        characters::update_character,
        characters::delete_character,
        characters::character_context,
        relationships::list_novel_relationships,
        relationships::create_relationship,
        relationships::list_character_relationships,
        relationships::update_relationship,
        relationships::delete_relationship,
        relationships::relationship_types,
        generation::generate,
        generation::generate_outline,
        generation::refresh_outline,
        generation::save_chapter,
        generation::regenerate_summary,
        generation::key_points,
    ),
    components(
        schemas(
            NovelResponse, CreateNovelRequest, UpdateNovelRequest, NovelContextResponse,
            ChapterResponse, CreateChapterRequest, UpdateChapterRequest, VersionResponse,
            SaveChapterRequest, SaveChapterResponse,
            CharacterResponse, CreateCharacterRequest, UpdateCharacterRequest,
            CharacterContextResponse,
            RelationshipResponse, CreateRelationshipRequest, UpdateRelationshipRequest,
            CharacterRelationshipResponse, NovelRelationshipResponse, RelationshipTypeResponse,
            GenerateRequest, GenerateResponse, GenerateOutlineRequest, OutlineResponse,
            RefreshOutlineResponse, KeyPointsResponse,
        )
    ),
    tags(
        (name = "Novel Studio API", description = "Novels, chapters, characters and AI-assisted drafting.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/novels", get(novels::list_novels).post(novels::create_novel))
        .route(
            "/novels/{id}",
            get(novels::get_novel)
                .patch(novels::update_novel)
                .delete(novels::delete_novel),
        )
        .route("/novels/{id}/context", get(novels::novel_context))
        .route(
            "/novels/{id}/character-context",
            get(characters::character_context),
        )
        .route(
            "/novels/{id}/characters",
            get(characters::list_characters).post(characters::create_character),
        )
        .route(
            "/novels/{id}/chapters",
            get(chapters::list_chapters).post(chapters::create_chapter),
        )
        .route(
            "/novels/{id}/relationships",
            get(relationships::list_novel_relationships).post(relationships::create_relationship),
        )
        .route("/novels/{id}/generate", post(generation::generate))
        .route(
            "/novels/{id}/outline/generate",
            post(generation::generate_outline),
        )
        .route(
            "/novels/{id}/outline/refresh",
            post(generation::refresh_outline),
        )
        .route(
            "/chapters/{id}",
            get(chapters::get_chapter)
                .patch(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        .route("/chapters/{id}/save", post(generation::save_chapter))
        .route("/chapters/{id}/select", post(chapters::select_chapter))
        .route("/chapters/{id}/versions", get(chapters::list_versions))
        .route("/chapters/{id}/summary", post(generation::regenerate_summary))
        .route("/chapters/{id}/key-points", post(generation::key_points))
        .route("/versions/{id}/restore", post(chapters::restore_version))
        .route(
            "/characters/{id}",
            get(characters::get_character)
                .patch(characters::update_character)
                .delete(characters::delete_character),
        )
        .route(
            "/characters/{id}/relationships",
            get(relationships::list_character_relationships),
        )
        .route(
            "/relationships/{id}",
            patch(relationships::update_relationship).delete(relationships::delete_relationship),
        )
        .route(
            "/relationship-types",
            get(relationships::relationship_types),
        )
        .with_state(state)
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Converts a port error into the status and message returned to the client.
pub(crate) fn port_error(e: PortError) -> (StatusCode, String) {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::ConstraintViolation(_) => StatusCode::CONFLICT,
        PortError::Upstream(_) => StatusCode::BAD_GATEWAY,
        PortError::Storage(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {:?}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, e.to_string())
}

/// A malformed request field, e.g. an unknown role label.
pub(crate) fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}
