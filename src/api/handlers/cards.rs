use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{CreateCardRequest, UpdateCardRequest};
use crate::api::state::AppState;
use crate::domain::{BoardError, Card, CardId, ListId};

pub async fn create_card(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), BoardError> {
    let store = state.require_store()?;
    let card = store
        .create_card(
            &ListId::from(list_id),
            &req.title,
            req.position,
            req.created_by.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<StatusCode, BoardError> {
    let store = state.require_store()?;
    store.patch_card(&CardId::from(id), req.into()).await?;

    Ok(StatusCode::NO_CONTENT)
}
