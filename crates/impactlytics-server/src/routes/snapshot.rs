use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `POST /api/cache/invalidate`: drop the cached snapshot so the next request
/// reloads the tables from DuckDB.
///
/// `previous` describes the dropped entry, or is `null` when nothing was cached.
#[tracing::instrument(skip(state))]
pub async fn invalidate(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let previous = state.cache.status().await;
    let invalidated = state.cache.invalidate().await;
    Json(json!({
        "data": {
            "invalidated": invalidated,
            "previous": previous,
        }
    }))
}
