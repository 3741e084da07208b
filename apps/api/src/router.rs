use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use arrival_cell::{arrival_routes, ArrivalCellState};

pub fn create_router(state: Arc<ArrivalCellState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Arrival notifier API is running!" }))
        .merge(arrival_routes(state))
}
