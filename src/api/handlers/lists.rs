use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::CreateListRequest;
use crate::api::state::AppState;
use crate::domain::{BoardError, BoardId, List};

pub async fn create_list(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<List>), BoardError> {
    let store = state.require_store()?;
    let list = store
        .create_list(&BoardId::from(board_id), &req.title, req.position)
        .await?;

    Ok((StatusCode::CREATED, Json(list)))
}
