use std::sync::Arc;

use axum::extract::State;
use axum::Extension;
use serde_json::{json, Value};

use crate::server::middleware::TrId;
use crate::server::response::Reply;
use crate::state::AppState;

/// Liveness plus the size of the knowledge base. A store that cannot be
/// counted reports `degraded` instead of failing the request.
pub async fn health(
    State(state): State<Arc<AppState>>,
    Extension(trid): Extension<TrId>,
) -> Reply<Value> {
    match state.knowledge.count().await {
        Ok(entries) => Reply::ok(
            trid,
            json!({ "status": "ok", "knowledge_entries": entries }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Knowledge store unavailable for health check");
            Reply::ok(
                trid,
                json!({ "status": "degraded", "knowledge_entries": null }),
            )
        }
    }
}
