#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::SqlitePool;
use tower::ServiceExt;

use board_sync::api::{create_router, AppState};
use board_sync::config::Config;
use board_sync::infrastructure::db;
use board_sync::services::ChangeFeed;

pub async fn setup_test_db() -> SqlitePool {
    db::init_memory_db()
        .await
        .expect("Failed to create test database")
}

pub fn test_config() -> Config {
    Config {
        port: 3000,
        database_url: "sqlite::memory:".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        ..Config::default()
    }
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(
        Some(pool),
        Arc::new(ChangeFeed::default()),
        Arc::new(test_config()),
    )
}

pub fn test_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    create_router(state, &config)
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    let request = request
        .body(Body::from(body.unwrap_or_default()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

/// Inserts a label, an assignee and `comments` comments on a card directly,
/// bypassing the API.
pub async fn decorate_card(pool: &SqlitePool, card_id: &str, comments: usize) {
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO card_labels (id, card_id, name, color, created_at) VALUES (?, ?, 'Bug', '#f44336', ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(card_id)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    let profile_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO profiles (id, full_name) VALUES (?, 'Ada Lovelace')")
        .bind(&profile_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO card_assignees (id, card_id, user_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(card_id)
        .bind(&profile_id)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    for i in 0..comments {
        sqlx::query("INSERT INTO comments (id, card_id, user_id, content, created_at) VALUES (?, ?, NULL, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(card_id)
            .bind(format!("comment {i}"))
            .bind(&now)
            .execute(pool)
            .await
            .unwrap();
    }
}
