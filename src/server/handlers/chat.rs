use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};

use super::inquiry::{parse_ask_body, AskRequest, AskResponse};
use crate::core::cancel::with_deadline;
use crate::server::middleware::TrId;
use crate::server::response::{HttpError, Reply, WithTrId};
use crate::state::AppState;

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Reply<AskResponse>, HttpError> {
    let request = parse_ask_body(body, &trid)?;
    tracing::info!(chars = request.msg.len(), "Basic chat request received");

    let cancel = state.request_token();
    let response = with_deadline(
        &cancel,
        state.request_timeout(),
        "basic chat",
        state.chat.ask(&request.msg, &cancel),
    )
    .await
    .with_trid(&trid)?;

    Ok(Reply::ok(trid, AskResponse { response }))
}

pub async fn ask_structured(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Reply<AskResponse>, HttpError> {
    let request = parse_ask_body(body, &trid)?;
    tracing::info!(chars = request.msg.len(), "Structured chat request received");

    let cancel = state.request_token();
    let response = with_deadline(
        &cancel,
        state.request_timeout(),
        "structured chat",
        state.chat.ask_structured(&request.msg, &cancel),
    )
    .await
    .with_trid(&trid)?;

    Ok(Reply::ok(trid, AskResponse { response }))
}
