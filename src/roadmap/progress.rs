//! Quiz completion tracking. A perfect score on an item's quiz unlocks the
//! item's title node for that user.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Db;
use crate::error::{Result, RoadmapError};
use crate::graph::title_node_id;

pub const DEFAULT_USER: &str = "default_user";

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Request body for `POST /api/progress/complete`
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub roadmap_item_id: i64,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default = "default_user")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// The attempt counted as a completion (perfect score)
    pub success: bool,
    /// First completion of this item by this user
    pub is_new_unlock: bool,
    pub roadmap_item_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub completed_item_ids: Vec<i64>,
    /// Knowledge graph node ids of the completed items
    pub unlocked_nodes: Vec<String>,
}

/// Record a quiz attempt.
///
/// Only `score == total_questions` (with at least one question) is stored.
/// Repeat completions keep the first record and report `is_new_unlock = false`.
pub async fn record_completion(db: &Db, request: CompletionRequest) -> Result<CompletionResult> {
    if request.score > request.total_questions {
        return Err(RoadmapError::InvalidInput(format!(
            "score {} exceeds total_questions {}",
            request.score, request.total_questions
        )));
    }
    if request.user_id.trim().is_empty() {
        return Err(RoadmapError::InvalidInput("user_id must not be empty".to_string()));
    }

    db.with_connection(move |conn| {
        let exists = conn
            .query_row(
                "SELECT 1 FROM roadmap_items WHERE id = ?1",
                params![request.roadmap_item_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(RoadmapError::NotFound(format!(
                "roadmap item {}",
                request.roadmap_item_id
            )));
        }

        let perfect = request.total_questions > 0 && request.score == request.total_questions;
        if !perfect {
            log::debug!(
                "Item {} attempt by {} scored {}/{}; not recorded",
                request.roadmap_item_id,
                request.user_id,
                request.score,
                request.total_questions
            );
            return Ok(CompletionResult {
                success: false,
                is_new_unlock: false,
                roadmap_item_id: request.roadmap_item_id,
            });
        }

        let inserted = conn.execute(
            "INSERT INTO quiz_progress (
                progress_id, user_id, roadmap_item_id, score, total_questions, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, roadmap_item_id) DO NOTHING",
            params![
                Uuid::new_v4().to_string(),
                request.user_id,
                request.roadmap_item_id,
                request.score,
                request.total_questions,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if inserted == 1 {
            log::info!("User {} unlocked item {}", request.user_id, request.roadmap_item_id);
        }

        Ok(CompletionResult {
            success: true,
            is_new_unlock: inserted == 1,
            roadmap_item_id: request.roadmap_item_id,
        })
    })
    .await
}

/// Items the user has completed, in completion order
pub async fn completed_items(db: &Db, user_id: &str) -> Result<UserProgress> {
    let user = user_id.to_string();
    let ids = db
        .with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT roadmap_item_id FROM quiz_progress
                 WHERE user_id = ?1 ORDER BY completed_at, roadmap_item_id",
            )?;
            let ids = stmt
                .query_map(params![user], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
            Ok(ids)
        })
        .await?;

    Ok(UserProgress {
        user_id: user_id.to_string(),
        unlocked_nodes: ids.iter().map(|id| title_node_id(*id)).collect(),
        completed_item_ids: ids,
    })
}
