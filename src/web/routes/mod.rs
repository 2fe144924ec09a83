pub mod sessions;

use axum::Router;

use super::AppState;

pub fn api_router() -> Router<AppState> {
    sessions::router()
}
