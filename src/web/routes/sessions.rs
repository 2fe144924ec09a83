use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::SessionPatch;
use crate::timer::{
    presets::{duration_from_parts, COUNTDOWN_PRESETS},
    TimerCommand,
};
use crate::web::{error_response, links::SessionLinks, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).patch(update_session))
        .route("/sessions/{id}/commands", post(run_command))
        .route("/sessions/{id}/duration", post(set_custom_duration))
        .route("/sessions/{id}/render", get(render_session))
        .route("/sessions/{id}/links", get(session_links))
        .route("/presets", get(list_presets))
}

fn bad_request(rejection: JsonRejection) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": rejection.body_text() })),
    )
}

// ---------- handlers ----------

#[derive(Deserialize)]
struct CreateBody {
    #[serde(default)]
    mode: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let mode = match body {
        Ok(Json(CreateBody { mode: Some(mode) })) => mode,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid timer mode" })),
            )
        }
    };

    match state.controller.create_session(&mode).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "session": session }))),
        Err(err) => error_response(err),
    }
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.controller.get_session(&id).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "session": session }))),
        Err(err) => error_response(err),
    }
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SessionPatch>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    match state.controller.patch_session(&id, patch).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "session": session }))),
        Err(err) => error_response(err),
    }
}

async fn run_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TimerCommand>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(command) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    match state.controller.run_command(&id, command).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "session": session }))),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct DurationParts {
    #[serde(default)]
    hours: u64,
    #[serde(default)]
    minutes: u64,
    #[serde(default)]
    seconds: u64,
}

async fn set_custom_duration(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DurationParts>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(parts) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    let Some(duration_ms) = duration_from_parts(parts.hours, parts.minutes, parts.seconds) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Duration must be greater than zero" })),
        );
    };

    match state
        .controller
        .run_command(&id, TimerCommand::SetCountdownDuration { duration_ms })
        .await
    {
        Ok(session) => (StatusCode::OK, Json(json!({ "session": session }))),
        Err(err) => error_response(err),
    }
}

async fn render_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.controller.render(&id).await {
        Ok(frame) => (StatusCode::OK, Json(json!(frame))),
        Err(err) => error_response(err),
    }
}

async fn session_links(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.controller.get_session(&id).await {
        Ok(session) => {
            let links = SessionLinks::new(&state.public_url, &session.id);
            (StatusCode::OK, Json(json!(links)))
        }
        Err(err) => error_response(err),
    }
}

async fn list_presets() -> Json<Value> {
    Json(json!({ "presets": COUNTDOWN_PRESETS }))
}
