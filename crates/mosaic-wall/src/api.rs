//! HTTP API for the wall.
//!
//! One read-only endpoint: the latest wall snapshot, verbatim. Everything
//! else about the wall lives in the front end.

use crate::export::WallSnapshot;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// The atomically swapped handoff between the pipeline and the responder.
pub type SharedSnapshot = Arc<RwLock<Option<WallSnapshot>>>;

/// Build the API router.
pub fn build_router(state: SharedSnapshot) -> Router {
    Router::new()
        .route("/patron-data", get(patron_data))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn patron_data(
    State(state): State<SharedSnapshot>,
) -> Result<Json<WallSnapshot>, StatusCode> {
    let snapshot = state.read().await.clone();
    match snapshot {
        Some(snapshot) => Ok(Json(snapshot)),
        // Nothing published yet: the first poll has not completed and no
        // previous snapshot was found on disk.
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
