//! Deterministic graph assembly from roadmap rows, plus the request-scoped
//! pipeline that enriches it with inferred edges.

use std::collections::HashMap;

use super::{infer_relationships, title_node_id, topic_node_id, Edge, KnowledgeGraph, Node, NodeType};
use crate::ai::GenerativeModel;
use crate::db::Db;
use crate::error::Result;
use crate::roadmap::{list_items, list_roadmaps, Roadmap, RoadmapItem};

/// Relationship label of topic -> title edges.
pub const CONTAINS: &str = "contains";
pub const CONTAINS_WEIGHT: f64 = 3.0;

/// Build topic/title nodes and `contains` edges.
///
/// Roadmaps are expected in id order; a roadmap's colour group is its index
/// in that order. Topic nodes come first, then title nodes.
pub fn build_base_graph(roadmaps: &[Roadmap], items: &[RoadmapItem]) -> KnowledgeGraph {
    if roadmaps.is_empty() {
        return KnowledgeGraph::default();
    }

    let groups: HashMap<i64, usize> = roadmaps
        .iter()
        .enumerate()
        .map(|(index, r)| (r.id, index))
        .collect();

    let mut nodes = Vec::with_capacity(roadmaps.len() + items.len());
    for roadmap in roadmaps {
        nodes.push(Node {
            id: topic_node_id(roadmap.id),
            label: roadmap.topic.clone(),
            node_type: NodeType::Topic,
            roadmap_id: Some(roadmap.id),
            group: groups.get(&roadmap.id).copied(),
        });
    }
    for item in items {
        nodes.push(Node {
            id: title_node_id(item.id),
            label: item.title.clone(),
            node_type: NodeType::Title,
            roadmap_id: Some(item.roadmap_id),
            group: Some(groups.get(&item.roadmap_id).copied().unwrap_or(0)),
        });
    }

    let edges = items
        .iter()
        .map(|item| {
            Edge::new(
                topic_node_id(item.roadmap_id),
                title_node_id(item.id),
                CONTAINS_WEIGHT,
                CONTAINS,
            )
        })
        .collect();

    KnowledgeGraph { nodes, edges }
}

/// Assemble the knowledge graph for one request.
///
/// Database failures propagate; inference failures only mean fewer edges.
/// With `model = None` the graph holds only `contains` edges.
pub async fn generate_knowledge_graph(
    db: &Db,
    model: Option<&dyn GenerativeModel>,
) -> Result<KnowledgeGraph> {
    let roadmaps = list_roadmaps(db).await?;
    if roadmaps.is_empty() {
        return Ok(KnowledgeGraph::default());
    }
    let items = list_items(db).await?;

    let mut graph = build_base_graph(&roadmaps, &items);
    let titles = graph.title_nodes();

    if titles.len() > 1 {
        match model {
            Some(model) => {
                let inferred = infer_relationships(model, &titles).await;
                let added = graph.merge_edges(inferred);
                log::info!("Merged {} inferred edges across {} titles", added, titles.len());
            }
            None => log::debug!("Relationship inference disabled; returning contains edges only"),
        }
    }

    Ok(graph)
}
