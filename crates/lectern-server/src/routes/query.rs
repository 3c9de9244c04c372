use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use lectern::rag::QueryResponse;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize, Serialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(session = ?request.session_id, "query received");
    let response = state
        .rag
        .query(&request.query, request.session_id.as_deref())
        .await?;
    Ok(Json(response))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(handler))
        .with_state(state)
}
