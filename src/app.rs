use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/days", get(handlers::get_days))
        .route("/api/days/:day/toggle", post(handlers::toggle_day))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/login", post(handlers::login))
        .route("/api/session", post(handlers::start_session))
        .with_state(state)
}
