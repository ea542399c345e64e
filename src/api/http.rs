use crate::ai::{GeminiClient, GenerativeModel};
use crate::config::Config;
use crate::db::Db;
use crate::error::{Result, RoadmapError};
use super::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared by all handlers.
///
/// Cheap to clone: `Db` is a path and the model sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// `None` when relationship inference is disabled.
    pub model: Option<Arc<dyn GenerativeModel>>,
}

impl AppState {
    pub fn new(db: Db, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { db, model }
    }

    pub fn model(&self) -> Option<&dyn GenerativeModel> {
        self.model.as_deref()
    }
}

/// HTTP server wrapper
pub struct ApiServer {
    state: AppState,
    allowed_origins: Vec<String>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Create the server from config; a missing API key disables inference.
    pub fn new(db: Db, config: &Config) -> Result<Self> {
        let model: Option<Arc<dyn GenerativeModel>> = match config.ai_api_key() {
            Some(key) => {
                let client = GeminiClient::from_config(&config.ai, key)?;
                log::info!("Relationship inference enabled (model: {})", client.name());
                let model: Arc<dyn GenerativeModel> = Arc::new(client);
                Some(model)
            }
            None => {
                log::warn!(
                    "Relationship inference disabled: set {} or enable [ai] in config.toml",
                    config.ai.api_key_env
                );
                None
            }
        };

        Ok(Self {
            state: AppState::new(db, model),
            allowed_origins: config.server.allowed_origins.clone(),
            host: config.server.host.clone(),
            port: config.server.port,
        })
    }

    /// Run the HTTP server until the process is stopped
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            RoadmapError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to bind to {}: {}. Set server.port in config.toml to use another port.",
                    addr, e
                ),
            ))
        })?;

        log::info!("Listening on http://{}", addr);
        log::info!("Knowledge graph: http://{}/api/knowledge-graph/", addr);

        let app = build_router(self.state.clone(), &self.allowed_origins);
        axum::serve(listener, app)
            .await
            .map_err(|e| RoadmapError::Io(std::io::Error::other(format!("HTTP server error: {}", e))))?;

        Ok(())
    }
}

/// Build the axum router.
///
/// An empty `allowed_origins` allows any origin (local development).
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/api/knowledge-graph", get(handlers::knowledge_graph))
        .route("/api/knowledge-graph/", get(handlers::knowledge_graph))
        .route("/api/knowledge-graph/snapshot", get(handlers::knowledge_graph_snapshot))
        .route(
            "/api/roadmaps",
            get(handlers::list_roadmaps).post(handlers::create_roadmap),
        )
        .route(
            "/api/roadmaps/",
            get(handlers::list_roadmaps).post(handlers::create_roadmap),
        )
        .route("/api/roadmaps/:roadmap_id", get(handlers::get_roadmap))
        .route("/api/quiz/:item_id", get(handlers::get_quiz))
        .route("/api/progress/complete", post(handlers::complete_quiz))
        .route("/api/progress/:user_id", get(handlers::user_progress))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::StubModel;
    use crate::db::test_db;
    use crate::roadmap::seed_demo_data;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_knowledge_graph_endpoint() {
        let (db, _dir) = test_db().await;
        seed_demo_data(&db).await.unwrap();
        let roadmaps = crate::roadmap::list_roadmaps_with_items(&db).await.unwrap();
        let functions = roadmaps[0].items[2].id;
        let networks = roadmaps[1].items[2].id;

        let model: Arc<dyn GenerativeModel> = Arc::new(StubModel::replying(&format!(
            r#"{{"relationships": [{{"source_id": "title_{}", "target_id": "title_{}",
                "relationship_type": "prerequisite", "weight": 2.5, "explanation": "x"}}]}}"#,
            functions, networks
        )));
        let router = build_router(AppState::new(db, Some(model)), &[]);

        let (status, body) = send(router, get_req("/api/knowledge-graph/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"].as_array().unwrap().len(), 8);
        let edges = body["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 7);
        assert_eq!(edges[6]["relationship"], "prerequisite");
        assert_eq!(body["nodes"][0]["type"], "topic");
    }

    #[tokio::test]
    async fn test_knowledge_graph_without_model_and_empty_db() {
        let (db, _dir) = test_db().await;
        let router = build_router(AppState::new(db, None), &[]);

        let (status, body) = send(router, get_req("/api/knowledge-graph")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"nodes": [], "edges": []}));
    }

    #[tokio::test]
    async fn test_knowledge_graph_without_model_on_seeded_db() {
        let (db, _dir) = test_db().await;
        seed_demo_data(&db).await.unwrap();
        let router = build_router(AppState::new(db, None), &[]);

        let (status, body) = send(router, get_req("/api/knowledge-graph/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"].as_array().unwrap().len(), 8);
        let edges = body["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 6);
        assert!(edges.iter().all(|e| e["relationship"] == "contains"));
    }

    #[tokio::test]
    async fn test_snapshot_endpoint_serves_seeded_graph() {
        let (db, _dir) = test_db().await;
        seed_demo_data(&db).await.unwrap();
        let router = build_router(AppState::new(db, None), &[]);

        let (status, body) = send(router, get_req("/api/knowledge-graph/snapshot")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"].as_array().unwrap().len(), 8);
        let edges = body["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 9);
        assert_eq!(edges.iter().filter(|e| e["relationship"] != "contains").count(), 3);
    }

    #[tokio::test]
    async fn test_knowledge_graph_database_failure_is_500() {
        let dir = tempfile::TempDir::new().unwrap();
        // No migrations: the roadmaps table does not exist.
        let db = Db::new(dir.path().join("empty.db"));
        let router = build_router(AppState::new(db, None), &[]);

        let (status, body) = send(router, get_req("/api/knowledge-graph/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Failed to generate knowledge graph"));
    }

    #[tokio::test]
    async fn test_roadmap_quiz_and_progress_flow() {
        let (db, _dir) = test_db().await;
        let router = build_router(AppState::new(db, None), &[]);

        let (status, created) = send(
            router.clone(),
            post_json(
                "/api/roadmaps/",
                json!({
                    "topic": "Rust",
                    "experience": "Beginner",
                    "items": [{
                        "title": "Ownership",
                        "questions": [{"question": "Who drops?", "options": ["owner", "borrower"], "correct": 0}]
                    }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let roadmap_id = created["id"].as_i64().unwrap();
        let item_id = created["items"][0]["id"].as_i64().unwrap();

        let (status, listed) = send(router.clone(), get_req("/api/roadmaps/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["items"][0]["title"], "Ownership");

        let (status, one) = send(router.clone(), get_req(&format!("/api/roadmaps/{}", roadmap_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["topic"], "Rust");

        let (status, quiz) = send(router.clone(), get_req(&format!("/api/quiz/{}", item_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quiz["roadmap_item_id"], item_id);
        assert_eq!(quiz["questions"][0]["options"][1], "borrower");

        let completion = json!({"roadmap_item_id": item_id, "score": 1, "total_questions": 1});
        let (status, first) = send(router.clone(), post_json("/api/progress/complete", completion.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["is_new_unlock"], true);

        let (_, second) = send(router.clone(), post_json("/api/progress/complete", completion)).await;
        assert_eq!(second["is_new_unlock"], false);

        let (status, progress) = send(router, get_req("/api/progress/default_user")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["unlocked_nodes"][0], format!("title_{}", item_id));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (db, _dir) = test_db().await;
        let router = build_router(AppState::new(db, None), &[]);

        let (status, _) = send(router.clone(), get_req("/api/quiz/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(router.clone(), get_req("/api/roadmaps/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(router.clone(), post_json("/api/roadmaps/", json!({"topic": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("topic"));

        let (status, body) = send(router.clone(), post_json("/api/roadmaps/", json!({"experience": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("topic"));

        let (status, body) = send(
            router.clone(),
            post_json("/api/progress/complete", json!({"score": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = send(
            router,
            post_json(
                "/api/progress/complete",
                json!({"roadmap_item_id": 999, "score": 1, "total_questions": 1}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let (db, _dir) = test_db().await;
        let router = build_router(AppState::new(db, None), &["http://localhost:3000".to_string()]);
        let (status, body) = send(router, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ai_enabled"], false);
    }
}
