use axum::{routing::get, Router};

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hospital scheduling API is running!" }))
        .merge(scheduling_routes(state))
}
