pub mod links;
pub mod routes;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{Json, Router};
use log::error;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::SessionError;
use crate::timer::TimerController;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: TimerController,
    pub public_url: String,
}

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let allow_origin = if cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allow_origin);

    Router::new()
        .route(
            "/health",
            axum::routing::get(|| async { Json(json!({ "status": "ok" })) }),
        )
        .nest("/api", routes::api_router())
        .layer(cors)
        .with_state(state)
}

pub(crate) fn error_response(err: SessionError) -> (StatusCode, Json<Value>) {
    match err {
        SessionError::InvalidMode(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid timer mode" })),
        ),
        SessionError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Timer session not found" })),
        ),
        SessionError::InvalidConfiguration(message) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
        }
        SessionError::Storage(err) => {
            error!("Timer session storage failure: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Timer session storage failure" })),
            )
        }
    }
}
