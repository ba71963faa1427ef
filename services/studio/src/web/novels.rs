//! services/studio/src/web/novels.rs
//!
//! Handlers for the novel resource and its narrative context.

use crate::web::dto::{CreateNovelRequest, NovelContextResponse, NovelResponse, UpdateNovelRequest};
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use novel_assistant_core::domain::{NewNovel, NovelUpdate};
use std::sync::Arc;

/// List every novel, most recently created first.
#[utoipa::path(
    get,
    path = "/novels",
    responses(
        (status = 200, description = "All novels", body = Vec<NovelResponse>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_novels(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let novels = app_state.repos.novels.list_all().await.map_err(port_error)?;
    Ok(Json(
        novels.into_iter().map(NovelResponse::from).collect::<Vec<_>>(),
    ))
}

/// Create a novel. Titles are unique.
#[utoipa::path(
    post,
    path = "/novels",
    request_body = CreateNovelRequest,
    responses(
        (status = 201, description = "Novel created", body = NovelResponse),
        (status = 409, description = "Empty or duplicate title")
    )
)]
pub async fn create_novel(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateNovelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let novel = app_state
        .repos
        .novels
        .create(NewNovel {
            title: payload.title,
            outline: payload.outline,
        })
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(NovelResponse::from(novel))))
}

#[utoipa::path(
    get,
    path = "/novels/{id}",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 200, description = "The novel", body = NovelResponse),
        (status = 404, description = "No such novel")
    )
)]
pub async fn get_novel(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let novel = app_state.repos.novels.get(novel_id).await.map_err(port_error)?;
    Ok(Json(NovelResponse::from(novel)))
}

/// Update the title, outline or active chapter number of a novel.
#[utoipa::path(
    patch,
    path = "/novels/{id}",
    params(("id" = i64, Path, description = "Novel id")),
    request_body = UpdateNovelRequest,
    responses(
        (status = 200, description = "The updated novel", body = NovelResponse),
        (status = 404, description = "No such novel"),
        (status = 409, description = "Duplicate title or invalid chapter number")
    )
)]
pub async fn update_novel(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
    Json(payload): Json<UpdateNovelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let novel = app_state
        .repos
        .novels
        .update(
            novel_id,
            NovelUpdate {
                title: payload.title,
                outline: payload.outline,
                current_chapter: payload.current_chapter,
            },
        )
        .await
        .map_err(port_error)?;
    Ok(Json(NovelResponse::from(novel)))
}

/// Delete a novel with all of its chapters, versions, characters and relationships.
#[utoipa::path(
    delete,
    path = "/novels/{id}",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 204, description = "Novel deleted"),
        (status = 404, description = "No such novel")
    )
)]
pub async fn delete_novel(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.repos.novels.delete(novel_id).await.map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The outline, previous chapter summary and roster used to prompt the generator.
#[utoipa::path(
    get,
    path = "/novels/{id}/context",
    params(("id" = i64, Path, description = "Novel id")),
    responses(
        (status = 200, description = "The narrative context", body = NovelContextResponse),
        (status = 404, description = "No such novel")
    )
)]
pub async fn novel_context(
    State(app_state): State<Arc<AppState>>,
    Path(novel_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let context = app_state
        .orchestrator
        .assembler()
        .assemble(novel_id)
        .await
        .map_err(port_error)?;
    Ok(Json(NovelContextResponse::from(context)))
}
