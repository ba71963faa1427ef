//! services/studio/src/web/generation.rs
//!
//! Handlers for the actions that call the generation service: drafting text,
//! saving a chapter with its follow-up steps, and refreshing summaries,
//! outlines and key points.

use crate::web::dto::{
    ChapterResponse, GenerateOutlineRequest, GenerateRequest, GenerateResponse,
    KeyPointsResponse, NovelResponse, OutlineResponse, RefreshOutlineResponse,
    SaveChapterRequest, SaveChapterResponse,
};
use crate::web::rest::{bad_request, port_error};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use novel_assistant_core::SaveOptions;
use std::sync::Arc;
use tracing::info;

/// Generate story text from an instruction and the novel's stored context.
#[utoipa::path(
    post,
    path = "/novels/{id}/generate",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "The generated text", body = GenerateResponse),
        (status = 400, description = "Empty instruction"),
        (status = 404, description = "No such novel or chapter"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn generate(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.instruction.trim().is_empty() {
        return Err(bad_request("instruction must not be empty"));
    }
    let outcome = app_state
        .orchestrator
        .generate_for_chapter(novel_id, payload.chapter_id, &payload.instruction)
        .await
        .map_err(port_error)?;
    Ok(Json(GenerateResponse::from(outcome)))
}

/// Generate and store an outline for the novel, or for one of its chapters.
#[utoipa::path(
    post,
    path = "/novels/{id}/outline/generate",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = GenerateOutlineRequest,
    responses(
        (status = 200, description = "The stored outline", body = OutlineResponse),
        (status = 404, description = "No such novel or chapter"),
        (status = 409, description = "The chapter has no content"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn generate_outline(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<GenerateOutlineRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outline = app_state
        .orchestrator
        .generate_outline(novel_id, payload.chapter_id)
        .await
        .map_err(port_error)?;
    Ok(Json(OutlineResponse { outline }))
}

/// Rebuild the novel outline from the chapter summaries.
#[utoipa::path(
    post,
    path = "/novels/{id}/outline/refresh",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 200, description = "The updated novel, or null without summaries", body = RefreshOutlineResponse),
        (status = 404, description = "No such novel"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn refresh_outline(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let novel = app_state
        .orchestrator
        .update_novel_outline(novel_id)
        .await
        .map_err(port_error)?;
    Ok(Json(RefreshOutlineResponse {
        novel: novel.map(NovelResponse::from),
    }))
}

/// Save chapter content, then merge new characters and refresh the summary.
///
/// Once the content is stored the request succeeds; failures of the follow-up
/// steps are reported in the response body.
#[utoipa::path(
    post,
    path = "/chapters/{id}/save",
    params(("id" = i64, Path, description = "Chapter id")),
    request_body = SaveChapterRequest,
    responses(
        (status = 200, description = "The save report", body = SaveChapterResponse),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn save_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
    Json(payload): Json<SaveChapterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let options = SaveOptions {
        extract_characters: payload.extract_characters.unwrap_or(true),
        auto_summary: payload
            .auto_summary
            .unwrap_or(app_state.config.auto_summary),
    };
    let report = app_state
        .orchestrator
        .save_chapter(chapter_id, payload.content, options)
        .await
        .map_err(port_error)?;
    info!(
        chapter_id,
        added = report.added_characters.len(),
        summary_failed = report.summary_error.is_some(),
        "Chapter saved"
    );
    Ok(Json(SaveChapterResponse::from(report)))
}

/// Replace the chapter summary with a freshly generated one.
#[utoipa::path(
    post,
    path = "/chapters/{id}/summary",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 200, description = "The chapter with its new summary", body = ChapterResponse),
        (status = 404, description = "No such chapter"),
        (status = 409, description = "The chapter has no content"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn regenerate_summary(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = app_state
        .orchestrator
        .regenerate_summary(chapter_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ChapterResponse::from(chapter)))
}

/// Extract a few one-line plot points from the chapter.
#[utoipa::path(
    post,
    path = "/chapters/{id}/key-points",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 200, description = "The key points", body = KeyPointsResponse),
        (status = 404, description = "No such chapter"),
        (status = 502, description = "The generation service failed")
    )
)]
pub async fn key_points(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let points = app_state
        .orchestrator
        .extract_key_points(chapter_id)
        .await
        .map_err(port_error)?;
    Ok(Json(KeyPointsResponse { points }))
}
