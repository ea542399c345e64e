//! HTTP API: knowledge graph, roadmaps, quizzes and progress.

mod handlers;
pub mod http;

pub use http::{build_router, ApiServer, AppState};
