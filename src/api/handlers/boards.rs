use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::CreateBoardRequest;
use crate::api::state::AppState;
use crate::domain::{Board, BoardError, BoardId, BoardSnapshot};

pub async fn create_board(
    State(state): State<AppState>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), BoardError> {
    let store = state.require_store()?;
    let board = store
        .create_board(&req.title, req.owner_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BoardSnapshot>, BoardError> {
    let store = state.require_store()?;
    let snapshot = store.snapshot(&BoardId::from(id)).await?;

    Ok(Json(snapshot))
}
