//! Knowledge graph: topic and title nodes derived from roadmap rows,
//! `contains` edges within a roadmap, and model-inferred edges across roadmaps.
//!
//! The graph is recomputed on every request; [`snapshot`] holds the only
//! persisted copy.

mod builder;
mod relations;
pub mod snapshot;

pub use builder::{build_base_graph, generate_knowledge_graph, CONTAINS, CONTAINS_WEIGHT};
pub use relations::{
    build_prompt, infer_relationships, parse_relationships, response_schema,
    sanitize_inferred_edges, MAX_WEIGHT, MIN_WEIGHT,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Node id of a roadmap's topic node.
pub fn topic_node_id(roadmap_id: i64) -> String {
    format!("topic_{}", roadmap_id)
}

/// Node id of a roadmap item's title node.
pub fn title_node_id(item_id: i64) -> String {
    format!("title_{}", item_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Topic,
    Title,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Topic => "topic",
            NodeType::Title => "title",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "topic" => Some(NodeType::Topic),
            "title" => Some(NodeType::Title),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic (roadmap) or title (roadmap item) in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub roadmap_id: Option<i64>,
    /// Colour group: index of the owning roadmap.
    pub group: Option<usize>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_relationship() -> String {
    "related".to_string()
}

/// A weighted, labelled edge between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_relationship")]
    pub relationship: String,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        weight: f64,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
            relationship: relationship.into(),
        }
    }
}

/// Nodes and edges for visualisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Title nodes in node order
    pub fn title_nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Title)
            .cloned()
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Append edges whose `(source, target)` pair is not already present.
    ///
    /// Duplicates inside `edges` are dropped too; the first occurrence wins.
    /// Returns the number of edges added.
    pub fn merge_edges(&mut self, edges: Vec<Edge>) -> usize {
        let mut existing: HashSet<(String, String)> = self
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        let before = self.edges.len();
        for edge in edges {
            if existing.insert((edge.source.clone(), edge.target.clone())) {
                self.edges.push(edge);
            }
        }
        self.edges.len() - before
    }
}
