//! Persisted copy of a knowledge graph (`knowledge_graph_nodes` /
//! `knowledge_graph_edges`). The seeder writes the curated demo graph here.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{Edge, KnowledgeGraph, Node, NodeType};
use crate::db::Db;
use crate::error::{Result, RoadmapError};

/// Replace the stored snapshot with `graph`
pub async fn save_snapshot(db: &Db, graph: &KnowledgeGraph) -> Result<()> {
    let graph = graph.clone();
    db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        write_snapshot(&tx, &graph)?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Load the stored snapshot in insertion order; empty if nothing was saved
pub async fn load_snapshot(db: &Db) -> Result<KnowledgeGraph> {
    db.with_connection(|conn| read_snapshot(conn)).await
}

pub(crate) fn write_snapshot(conn: &Connection, graph: &KnowledgeGraph) -> Result<()> {
    conn.execute("DELETE FROM knowledge_graph_edges", [])?;
    conn.execute("DELETE FROM knowledge_graph_nodes", [])?;

    let now = Utc::now().to_rfc3339();
    {
        let mut stmt = conn.prepare(
            "INSERT INTO knowledge_graph_nodes (id, label, node_type, roadmap_id, group_index, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, node) in graph.nodes.iter().enumerate() {
            stmt.execute(params![
                node.id,
                node.label,
                node.node_type.as_str(),
                node.roadmap_id,
                node.group.map(|g| g as i64),
                position as i64,
                now,
            ])?;
        }
    }

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO knowledge_graph_edges (source, target, weight, relationship, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for edge in &graph.edges {
        stmt.execute(params![edge.source, edge.target, edge.weight, edge.relationship, now])?;
    }

    log::debug!("Stored snapshot: {} nodes, {} edges", graph.nodes.len(), graph.edges.len());
    Ok(())
}

fn read_snapshot(conn: &Connection) -> Result<KnowledgeGraph> {
    let mut stmt = conn.prepare(
        "SELECT id, label, node_type, roadmap_id, group_index
         FROM knowledge_graph_nodes ORDER BY position",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut nodes = Vec::with_capacity(rows.len());
    for (id, label, node_type, roadmap_id, group) in rows {
        let node_type = NodeType::parse(&node_type)
            .ok_or_else(|| RoadmapError::Parse(format!("Unknown node type '{}' for {}", node_type, id)))?;
        nodes.push(Node {
            id,
            label,
            node_type,
            roadmap_id,
            group: group.map(|g| g as usize),
        });
    }

    let mut stmt = conn.prepare(
        "SELECT source, target, weight, relationship FROM knowledge_graph_edges ORDER BY id",
    )?;
    let edges = stmt
        .query_map([], |row| {
            Ok(Edge {
                source: row.get(0)?,
                target: row.get(1)?,
                weight: row.get(2)?,
                relationship: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(KnowledgeGraph { nodes, edges })
}
