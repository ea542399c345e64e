//! Cross-roadmap relationship inference.
//!
//! The model sees every title node and answers with a JSON list of
//! relationships; the answer is converted to edges and checked against the
//! graph before it is merged.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Edge, Node, NodeType};
use crate::ai::GenerativeModel;
use crate::error::{Result, RoadmapError};

pub const MIN_WEIGHT: f64 = 1.0;
pub const MAX_WEIGHT: f64 = 3.0;

const INSTRUCTIONS: &str = r#"Instructions:
1. Look for prerequisite relationships (one topic is foundational for another).
2. Look for complementary relationships (topics that build upon each other).
3. Look for conceptual connections (topics sharing concepts or techniques).
4. Consider cross-domain knowledge transfer (e.g. math concepts used in programming).

Return ONLY valid JSON with this exact structure:
{
  "relationships": [
    {
      "source_id": "title_X",
      "target_id": "title_Y",
      "relationship_type": "prerequisite|complementary|conceptual|transfer",
      "weight": 1.0 to 3.0,
      "explanation": "Brief explanation of the relationship"
    }
  ]
}

- Only include relationships between titles from DIFFERENT roadmaps.
- weight 1.0 = weak connection, 2.0 = moderate, 3.0 = strong.
- Be selective; do not create meaningless connections.
- Focus on educational and practical relationships."#;

#[derive(Serialize)]
struct PromptTopic<'a> {
    id: &'a str,
    label: &'a str,
    roadmap_id: Option<i64>,
}

#[derive(Deserialize)]
struct RelationshipsPayload {
    relationships: Vec<InferredRelationship>,
}

#[derive(Deserialize)]
struct InferredRelationship {
    source_id: String,
    target_id: String,
    relationship_type: String,
    weight: f64,
    explanation: String,
}

/// Render the analysis prompt for a set of title nodes.
pub fn build_prompt(title_nodes: &[Node]) -> Result<String> {
    let topics: Vec<PromptTopic<'_>> = title_nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Title)
        .map(|n| PromptTopic {
            id: &n.id,
            label: &n.label,
            roadmap_id: n.roadmap_id,
        })
        .collect();

    Ok(format!(
        "Analyze the following learning topics (titles) and identify meaningful relationships between them.\n\
         Each topic belongs to a learning roadmap; roadmap_id tells which one.\n\n\
         Topics to analyze:\n{}\n\n{}\n",
        serde_json::to_string_pretty(&topics)?,
        INSTRUCTIONS
    ))
}

/// Response schema sent with the prompt (OpenAPI subset used by Gemini).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "relationships": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "source_id": {"type": "STRING"},
                        "target_id": {"type": "STRING"},
                        "relationship_type": {"type": "STRING"},
                        "weight": {"type": "NUMBER"},
                        "explanation": {"type": "STRING"}
                    },
                    "required": ["source_id", "target_id", "relationship_type", "weight", "explanation"]
                }
            }
        },
        "required": ["relationships"]
    })
}

/// Parse the model's JSON answer into edges.
pub fn parse_relationships(raw: &str) -> Result<Vec<Edge>> {
    let payload: RelationshipsPayload = serde_json::from_str(raw.trim())
        .map_err(|e| RoadmapError::Parse(format!("Invalid relationships payload: {}", e)))?;

    Ok(payload
        .relationships
        .into_iter()
        .map(|rel| {
            log::debug!(
                "{} -> {} ({}, {}): {}",
                rel.source_id,
                rel.target_id,
                rel.relationship_type,
                rel.weight,
                rel.explanation
            );
            Edge::new(rel.source_id, rel.target_id, rel.weight, rel.relationship_type)
        })
        .collect())
}

/// Keep only edges between known titles of different roadmaps, with weights
/// clamped into `[MIN_WEIGHT, MAX_WEIGHT]`.
pub fn sanitize_inferred_edges(title_nodes: &[Node], edges: Vec<Edge>) -> Vec<Edge> {
    let roadmap_of: HashMap<&str, Option<i64>> = title_nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Title)
        .map(|n| (n.id.as_str(), n.roadmap_id))
        .collect();

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(edges.len());
    for mut edge in edges {
        let (Some(source), Some(target)) = (
            roadmap_of.get(edge.source.as_str()),
            roadmap_of.get(edge.target.as_str()),
        ) else {
            log::debug!("Dropping edge with unknown endpoint: {} -> {}", edge.source, edge.target);
            continue;
        };
        if edge.source == edge.target || source == target {
            log::debug!("Dropping same-roadmap edge: {} -> {}", edge.source, edge.target);
            continue;
        }
        if !edge.weight.is_finite() {
            continue;
        }
        if !seen.insert((edge.source.clone(), edge.target.clone())) {
            continue;
        }
        edge.weight = edge.weight.clamp(MIN_WEIGHT, MAX_WEIGHT);
        kept.push(edge);
    }
    kept
}

async fn request_relationships(model: &dyn GenerativeModel, title_nodes: &[Node]) -> Result<Vec<Edge>> {
    let prompt = build_prompt(title_nodes)?;
    let raw = model.generate_json(&prompt, &response_schema()).await?;
    parse_relationships(&raw)
}

/// Ask the model for relationships between titles of different roadmaps.
///
/// Never fails: any error is logged and yields no edges.
pub async fn infer_relationships(model: &dyn GenerativeModel, title_nodes: &[Node]) -> Vec<Edge> {
    if title_nodes.len() < 2 {
        return Vec::new();
    }

    match request_relationships(model, title_nodes).await {
        Ok(edges) => {
            let total = edges.len();
            let kept = sanitize_inferred_edges(title_nodes, edges);
            if kept.len() < total {
                log::info!("Discarded {} of {} inferred relationships", total - kept.len(), total);
            }
            kept
        }
        Err(e) => {
            log::warn!("Error analyzing relationships: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::StubModel;

    fn title(id: &str, label: &str, roadmap_id: i64) -> Node {
        Node {
            id: id.to_string(),
            label: label.to_string(),
            node_type: NodeType::Title,
            roadmap_id: Some(roadmap_id),
            group: Some(0),
        }
    }

    fn titles() -> Vec<Node> {
        vec![
            title("title_1", "Functions", 1),
            title("title_2", "Control Structures", 1),
            title("title_4", "Neural Networks", 2),
        ]
    }

    #[test]
    fn test_prompt_lists_titles() {
        let prompt = build_prompt(&titles()).unwrap();
        assert!(prompt.contains("\"id\": \"title_4\""));
        assert!(prompt.contains("\"label\": \"Neural Networks\""));
        assert!(prompt.contains("\"roadmap_id\": 2"));
        assert!(prompt.contains("DIFFERENT roadmaps"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["properties"]["relationships"]["items"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 5);
        assert_eq!(schema["required"][0], "relationships");
    }

    #[test]
    fn test_parse_relationships() {
        let edges = parse_relationships(
            r#"{"relationships": [{"source_id": "title_1", "target_id": "title_4",
                "relationship_type": "prerequisite", "weight": 2, "explanation": "x"}]}"#,
        )
        .unwrap();
        assert_eq!(edges, vec![Edge::new("title_1", "title_4", 2.0, "prerequisite")]);
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_relationships(r#"{"relationships": [{"source_id": "title_1"}]}"#).unwrap_err();
        assert!(matches!(err, RoadmapError::Parse(_)));
        assert!(parse_relationships("not json").is_err());
    }

    #[test]
    fn test_sanitize_enforces_cross_roadmap_and_weight_bounds() {
        let kept = sanitize_inferred_edges(
            &titles(),
            vec![
                Edge::new("title_1", "title_4", 7.5, "prerequisite"),
                Edge::new("title_1", "title_2", 2.0, "complementary"),
                Edge::new("title_4", "title_99", 2.0, "conceptual"),
                Edge::new("topic_1", "title_4", 2.0, "conceptual"),
                Edge::new("title_2", "title_4", 0.2, "transfer"),
                Edge::new("title_2", "title_4", 2.0, "transfer"),
                Edge::new("title_4", "title_1", f64::NAN, "transfer"),
                Edge::new("title_1", "title_1", 2.0, "conceptual"),
            ],
        );

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].weight, MAX_WEIGHT);
        assert_eq!(kept[1].weight, MIN_WEIGHT);
        assert_eq!(kept[1].relationship, "transfer");
        assert!(kept.iter().all(|e| e.source != e.target));
    }

    #[tokio::test]
    async fn test_infer_needs_two_titles() {
        let model = StubModel::replying(r#"{"relationships": []}"#);
        let edges = infer_relationships(&model, &titles()[..1]).await;
        assert!(edges.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_infer_swallows_malformed_output() {
        let model = StubModel::replying("{\"relationships\": \"nope\"}");
        let edges = infer_relationships(&model, &titles()).await;
        assert!(edges.is_empty());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_infer_edges_are_structurally_valid() {
        let model = StubModel::replying(
            r#"{"relationships": [
                {"source_id": "title_2", "target_id": "title_4", "relationship_type": "prerequisite",
                 "weight": 2.0, "explanation": "loops before training loops"},
                {"source_id": "title_1", "target_id": "title_2", "relationship_type": "complementary",
                 "weight": 1.0, "explanation": "same roadmap"}
            ]}"#,
        );
        let nodes = titles();
        let edges = infer_relationships(&model, &nodes).await;

        assert_eq!(edges.len(), 1);
        for edge in &edges {
            let s = nodes.iter().find(|n| n.id == edge.source).unwrap();
            let t = nodes.iter().find(|n| n.id == edge.target).unwrap();
            assert_ne!(s.roadmap_id, t.roadmap_id);
            assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&edge.weight));
        }
        assert!(model.last_prompt().unwrap().contains("Control Structures"));
    }
}
