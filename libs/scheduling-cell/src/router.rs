// libs/scheduling-cell/src/router.rs
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppState;

pub fn scheduling_routes(state: AppState) -> Router {
    // All scheduling operations require authentication
    let protected_routes = Router::new()
        .route("/slots", get(handlers::list_slots))
        .route("/bookings", post(handlers::reserve_booking))
        .route("/bookings", get(handlers::list_bookings))
        .route("/bookings/{booking_id}", get(handlers::get_booking))
        .route("/bookings/{booking_id}", delete(handlers::cancel_booking))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
