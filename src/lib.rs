pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod roadmap;

pub use config::Config;
pub use error::{Result, RoadmapError};
pub use graph::{generate_knowledge_graph, Edge, KnowledgeGraph, Node, NodeType};
