use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::LogActivityRequest;
use crate::api::state::AppState;
use crate::domain::{BoardError, BoardId};

pub async fn log_activity(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(req): Json<LogActivityRequest>,
) -> Result<StatusCode, BoardError> {
    let store = state.require_store()?;
    store
        .log_activity(req.into_entry(BoardId::from(board_id)))
        .await?;

    Ok(StatusCode::CREATED)
}
