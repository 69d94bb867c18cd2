use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, health_check};
use crate::state::AppState;

/// Room for the JSON envelope around `message`
const BODY_OVERHEAD_BYTES: usize = 16 * 1024;

/// A control character escapes to `\u00XX`, six bytes on the wire
const MAX_ESCAPE_EXPANSION: usize = 6;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/api/health", get(health_check))
}

/// Full application: routes, body limit, tracing and CORS
pub fn build_app(state: AppState) -> Router {
    let body_limit = raw_body_limit(state.config.system_config.max_message_bytes);

    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Raw request body limit. `max_message_bytes` itself is enforced on the
/// decoded `message` in the handler.
pub(crate) fn raw_body_limit(max_message_bytes: usize) -> usize {
    max_message_bytes
        .saturating_mul(MAX_ESCAPE_EXPANSION)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_escaped_message_fits_raw_limit() {
        let message = "\u{1}".repeat(1024);
        let body = serde_json::json!({ "message": message }).to_string();
        assert!(body.len() <= raw_body_limit(message.len()));
    }

    #[test]
    fn raw_limit_saturates() {
        assert_eq!(raw_body_limit(usize::MAX), usize::MAX);
    }
}
