use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::core::cancel::with_deadline;
use crate::core::errors::ApiError;
use crate::ingest::IngestionReport;
use crate::server::middleware::TrId;
use crate::server::response::{HttpError, Reply, WithTrId};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub msg: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

pub(super) fn parse_ask_body(
    body: Result<Json<AskRequest>, JsonRejection>,
    trid: &TrId,
) -> Result<AskRequest, HttpError> {
    let Json(request) = body
        .map_err(|e| ApiError::invalid_parameter(format!("invalid json: {}", e.body_text())))
        .with_trid(trid)?;
    Ok(request)
}

pub async fn embed_origins(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
) -> Result<Reply<IngestionReport>, HttpError> {
    tracing::info!("Embed origins request received");
    let cancel = state.request_token();
    let report = with_deadline(
        &cancel,
        state.request_timeout(),
        "ingestion",
        state.ingestion.embed_origins(&cancel),
    )
    .await
    .with_trid(&trid)?;

    Ok(Reply::created(trid, report))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Reply<AskResponse>, HttpError> {
    let request = parse_ask_body(body, &trid)?;
    tracing::info!(chars = request.msg.len(), "Ask request received");

    let cancel = state.request_token();
    let answer = with_deadline(
        &cancel,
        state.request_timeout(),
        "inquiry",
        state.inquiry.ask(&request.msg, &cancel),
    )
    .await
    .with_trid(&trid)?;

    Ok(Reply::ok(
        trid,
        AskResponse {
            response: answer.answer,
        },
    ))
}
