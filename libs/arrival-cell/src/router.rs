// libs/arrival-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::ArrivalCellState;

/// Creates the arrival notification routes
pub fn arrival_routes(state: Arc<ArrivalCellState>) -> Router {
    Router::new()
        .route("/health", get(arrival_health_check))
        .route("/settings", get(get_settings))
        .route("/arrivals", post(report_arrival))
        .route("/hangouts", post(create_hangout))
        .route("/hangouts/{encounter_id}", get(get_hangout))
        .with_state(state)
}
