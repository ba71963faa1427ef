//! HTTP surface tests: requests go through the real router and SQLite
//! adapters, with the scripted generation service behind them.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{store, ScriptedGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use studio_lib::config::Config;
use studio_lib::web::{router, AppState};
use tower::ServiceExt;

async fn app() -> (Router, Arc<ScriptedGenerator>) {
    let store = store().await;
    let generator = Arc::new(ScriptedGenerator::default());
    let config = Config::from_lookup(|_| None).unwrap();
    let state = AppState::new(store.repositories(), generator.clone(), Arc::new(config));
    (router(Arc::new(state)), generator)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn novel_lifecycle() {
    let (app, _) = app().await;

    let (status, created) = call(
        &app,
        "POST",
        "/novels",
        Some(json!({"title": "测试小说", "outline": "O"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["current_chapter"], 1);
    let id = created["id"].as_i64().unwrap();

    let (status, _) = call(&app, "POST", "/novels", Some(json!({"title": "测试小说"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, context) = call(&app, "GET", &format!("/novels/{}/context", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(context, json!({"outline": "O"}));

    let (status, updated) = call(
        &app,
        "PATCH",
        &format!("/novels/{}", id),
        Some(json!({"outline": "新大纲"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["outline"], "新大纲");
    assert_eq!(updated["title"], "测试小说");

    let (status, _) = call(&app, "DELETE", &format!("/novels/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", &format!("/novels/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chapters_are_saved_versioned_and_restored() {
    let (app, generator) = app().await;
    let (_, novel) = call(&app, "POST", "/novels", Some(json!({"title": "章节"}))).await;
    let novel_id = novel["id"].as_i64().unwrap();

    let (status, chapter) = call(
        &app,
        "POST",
        &format!("/novels/{}/chapters", novel_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chapter["chapter_number"], 1);
    assert_eq!(chapter["title"], "第1章");
    let chapter_id = chapter["id"].as_i64().unwrap();

    ScriptedGenerator::set(&generator.summary, Err("down"));
    let (status, report) = call(
        &app,
        "POST",
        &format!("/chapters/{}/save", chapter_id),
        Some(json!({"content": "第一稿"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["chapter"]["content"], "第一稿");
    assert!(report["summary_error"].is_string());

    let (_, versions) = call(&app, "GET", &format!("/chapters/{}/versions", chapter_id), None).await;
    let versions = versions.as_array().unwrap().clone();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["comment"], "自动保存");

    let initial_id = versions[1]["id"].as_i64().unwrap();
    let (status, _) = call(&app, "POST", &format!("/versions/{}/restore", initial_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, restored) = call(&app, "GET", &format!("/chapters/{}", chapter_id), None).await;
    assert_eq!(restored["content"], "");

    let (status, _) = call(&app, "POST", &format!("/chapters/{}/summary", chapter_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/novels/{}/chapters", novel_id),
        Some(json!({"chapter_number": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn characters_and_relationships() {
    let (app, _) = app().await;
    let (_, novel) = call(&app, "POST", "/novels", Some(json!({"title": "人物志"}))).await;
    let novel_id = novel["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        &format!("/novels/{}/characters", novel_id),
        Some(json!({"name": "林远", "role_type": "路人"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, hero) = call(
        &app,
        "POST",
        &format!("/novels/{}/characters", novel_id),
        Some(json!({"name": "林远", "role_type": "主角"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(hero["role_type"], "主角");
    assert_eq!(hero["status"], "活跃");

    let (_, rival) = call(
        &app,
        "POST",
        &format!("/novels/{}/characters", novel_id),
        Some(json!({"name": "赵九", "role_type": "antagonist"})),
    )
    .await;
    assert_eq!(rival["role_type"], "反派");

    let (status, relationship) = call(
        &app,
        "POST",
        &format!("/novels/{}/relationships", novel_id),
        Some(json!({
            "character1_id": hero["id"],
            "character2_id": rival["id"],
            "relationship_type": "敌人"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, seen) = call(
        &app,
        "GET",
        &format!("/characters/{}/relationships", rival["id"]),
        None,
    )
    .await;
    assert_eq!(seen[0]["self_name"], "赵九");
    assert_eq!(seen[0]["other_name"], "林远");

    let (status, updated) = call(
        &app,
        "PATCH",
        &format!("/characters/{}", rival["id"]),
        Some(json!({"status": "已死亡"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "已死亡");

    let (_, focused) = call(
        &app,
        "GET",
        &format!("/novels/{}/character-context?name=%E6%9E%97%E8%BF%9C", novel_id),
        None,
    )
    .await;
    assert_eq!(focused["characters"].as_array().unwrap().len(), 1);
    assert_eq!(focused["relationships"].as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/relationships/{}", relationship["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, catalog) = call(&app, "GET", "/relationship-types", None).await;
    assert_eq!(catalog.as_array().unwrap().len(), 17);
    assert_eq!(catalog[0]["type"], "父子");
}

#[tokio::test]
async fn generation_failures_surface_as_bad_gateway() {
    let (app, generator) = app().await;
    let (_, novel) = call(&app, "POST", "/novels", Some(json!({"title": "生成"}))).await;
    let novel_id = novel["id"].as_i64().unwrap();

    let (status, generated) = call(
        &app,
        "POST",
        &format!("/novels/{}/generate", novel_id),
        Some(json!({"instruction": "写开头"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["text"], "生成的内容");

    let (status, _) = call(
        &app,
        "POST",
        &format!("/novels/{}/generate", novel_id),
        Some(json!({"instruction": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ScriptedGenerator::set(&generator.outline, Err("unavailable"));
    let (status, _) = call(
        &app,
        "POST",
        &format!("/novels/{}/outline/generate", novel_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, refreshed) = call(
        &app,
        "POST",
        &format!("/novels/{}/outline/refresh", novel_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["novel"], Value::Null);
}
