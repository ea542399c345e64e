use super::http::AppState;
use crate::error::RoadmapError;
use crate::graph::{generate_knowledge_graph, snapshot};
use crate::roadmap::{self, CompletionRequest, NewRoadmap};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Map a library error to a status code and a `{"detail": ...}` body.
fn error_response(err: RoadmapError) -> Response {
    let status = match &err {
        RoadmapError::NotFound(_) => StatusCode::NOT_FOUND,
        RoadmapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {}", err);
    }
    (status, Json(serde_json::json!({ "detail": err.to_string() }))).into_response()
}

/// Malformed or incomplete JSON bodies are a 400 with the usual error body.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> crate::error::Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| RoadmapError::InvalidInput(rejection.body_text()))
}

fn respond<T: serde::Serialize>(result: crate::error::Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/knowledge-graph/
///
/// Any assembly failure is a 500; model failures were already absorbed.
pub async fn knowledge_graph(State(state): State<AppState>) -> Response {
    match generate_knowledge_graph(&state.db, state.model()).await {
        Ok(graph) => (StatusCode::OK, Json(graph)).into_response(),
        Err(e) => {
            log::error!("Failed to generate knowledge graph: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "detail": format!("Failed to generate knowledge graph: {}", e)
                })),
            )
                .into_response()
        }
    }
}

/// GET /api/knowledge-graph/snapshot
pub async fn knowledge_graph_snapshot(State(state): State<AppState>) -> Response {
    respond(snapshot::load_snapshot(&state.db).await)
}

/// GET /api/roadmaps/
pub async fn list_roadmaps(State(state): State<AppState>) -> Response {
    respond(roadmap::list_roadmaps_with_items(&state.db).await)
}

/// GET /api/roadmaps/:roadmap_id
pub async fn get_roadmap(State(state): State<AppState>, Path(roadmap_id): Path<i64>) -> Response {
    respond(roadmap::get_roadmap(&state.db, roadmap_id).await)
}

/// POST /api/roadmaps/
pub async fn create_roadmap(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewRoadmap>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(e) => return error_response(e),
    };
    match roadmap::create_roadmap(&state.db, body).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/quiz/:item_id
pub async fn get_quiz(State(state): State<AppState>, Path(item_id): Path<i64>) -> Response {
    respond(roadmap::get_quiz(&state.db, item_id).await)
}

/// POST /api/progress/complete
pub async fn complete_quiz(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CompletionRequest>, JsonRejection>,
) -> Response {
    match json_body(payload) {
        Ok(body) => respond(roadmap::record_completion(&state.db, body).await),
        Err(e) => error_response(e),
    }
}

/// GET /api/progress/:user_id
pub async fn user_progress(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    respond(roadmap::completed_items(&state.db, &user_id).await)
}

pub async fn health(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "roadmap-kg",
            "version": env!("CARGO_PKG_VERSION"),
            "ai_enabled": state.model.is_some(),
        })),
    )
        .into_response()
}
