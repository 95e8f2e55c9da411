use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health, inquiry, users};
use crate::server::middleware::{assign_trid, TRID_HEADER};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// Every route runs behind the transaction-id middleware, so handlers can
/// extract the [`TrId`](crate::server::middleware::TrId) extension.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.config.app.cors_allowed_origins);
    Router::new()
        .route("/healthz", get(health::health))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route("/inquiries/embed-origins", post(inquiry::embed_origins))
        .route("/inquiries/ask", post(inquiry::ask))
        .route("/basic-chat/ask", post(chat::ask))
        .route("/basic-chat/ask-structured", post(chat::ask_structured))
        .with_state(state)
        .layer(middleware::from_fn(assign_trid))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let origins = resolve_allowed_origins(configured)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(TRID_HEADER)])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }
    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_origins_replace_local_defaults() {
        let configured = vec![" https://app.example.com ".to_string(), "".to_string()];
        assert_eq!(
            resolve_allowed_origins(&configured),
            vec!["https://app.example.com".to_string()]
        );
        assert_eq!(resolve_allowed_origins(&[]), default_local_origins());
    }
}
