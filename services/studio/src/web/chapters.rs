//! services/studio/src/web/chapters.rs
//!
//! Handlers for chapters and their version history.

use crate::web::dto::{
    ChapterListParams, ChapterResponse, CreateChapterRequest, NovelResponse,
    UpdateChapterRequest, VersionResponse,
};
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use novel_assistant_core::domain::{ChapterQuery, ChapterUpdate, NewChapter};
use std::sync::Arc;

/// List a novel's chapters in ascending order, optionally only those before a number.
#[utoipa::path(
    get,
    path = "/novels/{id}/chapters",
    params(("id" = i64, Path, description = "Novel id"), ChapterListParams),
    responses(
        (status = 200, description = "Chapters in ascending order", body = Vec<ChapterResponse>),
        (status = 404, description = "No such novel")
    )
)]
pub async fn list_chapters(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Query(params): Query<ChapterListParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.repos.novels.get(novel_id).await.map_err(port_error)?;
    let chapters = app_state
        .repos
        .chapters
        .list_by_novel(
            novel_id,
            ChapterQuery {
                before_chapter: params.before_chapter,
                limit: params.limit,
            },
        )
        .await
        .map_err(port_error)?;
    Ok(Json(
        chapters.into_iter().map(ChapterResponse::from).collect::<Vec<_>>(),
    ))
}

/// Create a chapter. Without a number it is appended after the last chapter.
#[utoipa::path(
    post,
    path = "/novels/{id}/chapters",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = CreateChapterRequest,
    responses(
        (status = 201, description = "Chapter created", body = ChapterResponse),
        (status = 404, description = "No such novel"),
        (status = 409, description = "Chapter number taken or below 1")
    )
)]
pub async fn create_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = match payload.chapter_number {
        None => app_state
            .orchestrator
            .new_chapter(novel_id, payload.title)
            .await,
        Some(chapter_number) => {
            let title = payload
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("第{}章", chapter_number));
            app_state
                .repos
                .chapters
                .create(NewChapter {
                    novel_id,
                    chapter_number,
                    title,
                    ..NewChapter::default()
                })
                .await
        }
    }
    .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(ChapterResponse::from(chapter))))
}

#[utoipa::path(
    get,
    path = "/chapters/{id}",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 200, description = "The chapter", body = ChapterResponse),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn get_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = app_state.repos.chapters.get(chapter_id).await.map_err(port_error)?;
    Ok(Json(ChapterResponse::from(chapter)))
}

/// Update chapter fields. New content versions the old content first; no
/// follow-up generation runs (see `/chapters/{id}/save`).
#[utoipa::path(
    patch,
    path = "/chapters/{id}",
    params(("id" = i64, Path, description = "Chapter id")),
    request_body = UpdateChapterRequest,
    responses(
        (status = 200, description = "The updated chapter", body = ChapterResponse),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn update_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = app_state
        .repos
        .chapters
        .update(
            chapter_id,
            ChapterUpdate {
                title: payload.title,
                content: payload.content,
                summary: payload.summary,
                outline: payload.outline,
            },
        )
        .await
        .map_err(port_error)?;
    Ok(Json(ChapterResponse::from(chapter)))
}

#[utoipa::path(
    delete,
    path = "/chapters/{id}",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 204, description = "Chapter and its versions deleted"),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn delete_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.repos.chapters.delete(chapter_id).await.map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Make this chapter the active one of its novel.
#[utoipa::path(
    post,
    path = "/chapters/{id}/select",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 200, description = "The novel with its new current chapter", body = NovelResponse),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn select_chapter(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = app_state.repos.chapters.get(chapter_id).await.map_err(port_error)?;
    let novel = app_state
        .orchestrator
        .select_chapter(chapter.novel_id, chapter_id)
        .await
        .map_err(port_error)?;
    Ok(Json(NovelResponse::from(novel)))
}

/// The version history of a chapter, newest first.
#[utoipa::path(
    get,
    path = "/chapters/{id}/versions",
    params(("id" = i64, Path, description = "Chapter id")),
    responses(
        (status = 200, description = "Versions, newest first", body = Vec<VersionResponse>),
        (status = 404, description = "No such chapter")
    )
)]
pub async fn list_versions(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let versions = app_state
        .repos
        .chapters
        .versions(chapter_id)
        .await
        .map_err(port_error)?;
    Ok(Json(
        versions.into_iter().map(VersionResponse::from).collect::<Vec<_>>(),
    ))
}

/// Write a stored version back as the chapter content. The content being
/// replaced is itself kept as a version.
#[utoipa::path(
    post,
    path = "/versions/{id}/restore",
    params(("id" = i64, Path, description = "Version id")),
    responses(
        (status = 200, description = "The restored chapter", body = ChapterResponse),
        (status = 404, description = "No such version")
    )
)]
pub async fn restore_version(
    State(app_state): State<Arc<AppState>>,
    Path(version_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chapter = app_state
        .repos
        .chapters
        .restore_version(version_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ChapterResponse::from(chapter)))
}
