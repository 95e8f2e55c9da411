use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::server::middleware::TrId;
use crate::server::response::{HttpError, PageParams, Reply, WithTrId};
use crate::state::AppState;
use crate::users::{User, UserPage};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Reply<User>, HttpError> {
    let Json(request) = body
        .map_err(|_| ApiError::invalid_parameter("invalid json"))
        .with_trid(&trid)?;

    let user = state
        .users
        .create_user(&request.name, &request.email)
        .await
        .with_trid(&trid)?;
    Ok(Reply::created(trid, user))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    Query(params): Query<PageParams>,
) -> Result<Reply<UserPage>, HttpError> {
    let (offset, limit) = params.resolve();
    let page = state
        .users
        .list_users(offset, limit)
        .await
        .with_trid(&trid)?;
    Ok(Reply::ok(trid, page))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
    Path(raw_id): Path<String>,
) -> Result<Reply<User>, HttpError> {
    let id = raw_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::invalid_parameter("invalid user id format"))
        .with_trid(&trid)?;

    let user = state.users.get_user(id).await.with_trid(&trid)?;
    Ok(Reply::ok(trid, user))
}
