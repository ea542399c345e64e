use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{NewRoadmap, Quiz, QuizQuestion, Roadmap, RoadmapItem, RoadmapWithItems};
use crate::db::Db;
use crate::error::{Result, RoadmapError};

/// All roadmaps ordered by id
pub async fn list_roadmaps(db: &Db) -> Result<Vec<Roadmap>> {
    db.with_connection(|conn| query_roadmaps(conn)).await
}

/// All roadmap items ordered by id
pub async fn list_items(db: &Db) -> Result<Vec<RoadmapItem>> {
    db.with_connection(|conn| query_items(conn, None)).await
}

/// Every roadmap with its items attached
pub async fn list_roadmaps_with_items(db: &Db) -> Result<Vec<RoadmapWithItems>> {
    db.with_connection(|conn| {
        let roadmaps = query_roadmaps(conn)?;
        let mut items = query_items(conn, None)?;
        Ok(roadmaps
            .into_iter()
            .map(|roadmap| {
                let (own, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|i| i.roadmap_id == roadmap.id);
                items = rest;
                RoadmapWithItems { roadmap, items: own }
            })
            .collect())
    })
    .await
}

/// One roadmap with its items
pub async fn get_roadmap(db: &Db, roadmap_id: i64) -> Result<RoadmapWithItems> {
    db.with_connection(move |conn| {
        let roadmap = conn
            .query_row(
                "SELECT id, topic, experience, created_at FROM roadmaps WHERE id = ?1",
                params![roadmap_id],
                roadmap_from_row,
            )
            .optional()?
            .ok_or_else(|| RoadmapError::NotFound(format!("roadmap {}", roadmap_id)))?;
        let items = query_items(conn, Some(roadmap_id))?;
        Ok(RoadmapWithItems { roadmap, items })
    })
    .await
}

/// Validate and insert a roadmap with its items and quiz questions in one transaction
pub async fn create_roadmap(db: &Db, new: NewRoadmap) -> Result<RoadmapWithItems> {
    new.validate()?;
    db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        let created = insert_roadmap(&tx, &new, &Utc::now().to_rfc3339())?;
        tx.commit()?;
        log::info!(
            "Created roadmap {} '{}' with {} items",
            created.roadmap.id,
            created.roadmap.topic,
            created.items.len()
        );
        Ok(created)
    })
    .await
}

/// Quiz questions for a roadmap item.
///
/// Returns NotFound when the item does not exist or has no questions.
pub async fn get_quiz(db: &Db, roadmap_item_id: i64) -> Result<Quiz> {
    db.with_connection(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT id, roadmap_item_id, question, options, correct
             FROM quiz_questions WHERE roadmap_item_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![roadmap_item_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        if rows.is_empty() {
            return Err(RoadmapError::NotFound(format!(
                "quiz for roadmap item {}",
                roadmap_item_id
            )));
        }

        let mut questions = Vec::with_capacity(rows.len());
        for (id, item_id, question, options, correct) in rows {
            questions.push(QuizQuestion {
                id,
                roadmap_item_id: item_id,
                question,
                options: serde_json::from_str(&options)?,
                correct: usize::try_from(correct)
                    .map_err(|_| RoadmapError::Parse(format!("negative correct index in question {}", id)))?,
            });
        }
        Ok(Quiz { roadmap_item_id, questions })
    })
    .await
}

/// Insert a validated roadmap on an open connection or transaction.
pub(crate) fn insert_roadmap(
    conn: &Connection,
    new: &NewRoadmap,
    created_at: &str,
) -> Result<RoadmapWithItems> {
    conn.execute(
        "INSERT INTO roadmaps (topic, experience, created_at) VALUES (?1, ?2, ?3)",
        params![new.topic, new.experience, created_at],
    )?;
    let roadmap = Roadmap {
        id: conn.last_insert_rowid(),
        topic: new.topic.clone(),
        experience: new.experience.clone(),
        created_at: created_at.to_string(),
    };

    let mut items = Vec::with_capacity(new.items.len());
    for item in &new.items {
        conn.execute(
            "INSERT INTO roadmap_items (roadmap_id, title, summary, level, study_material)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                roadmap.id,
                item.title,
                item.summary,
                item.level,
                serde_json::to_string(&item.study_material)?,
            ],
        )?;
        let item_id = conn.last_insert_rowid();

        for q in &item.questions {
            conn.execute(
                "INSERT INTO quiz_questions (roadmap_item_id, question, options, correct)
                 VALUES (?1, ?2, ?3, ?4)",
                params![item_id, q.question, serde_json::to_string(&q.options)?, q.correct as i64],
            )?;
        }

        items.push(RoadmapItem {
            id: item_id,
            roadmap_id: roadmap.id,
            title: item.title.clone(),
            summary: item.summary.clone(),
            level: item.level,
            study_material: item.study_material.clone(),
        });
    }

    Ok(RoadmapWithItems { roadmap, items })
}

fn roadmap_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Roadmap> {
    Ok(Roadmap {
        id: row.get(0)?,
        topic: row.get(1)?,
        experience: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn query_roadmaps(conn: &Connection) -> Result<Vec<Roadmap>> {
    let mut stmt =
        conn.prepare("SELECT id, topic, experience, created_at FROM roadmaps ORDER BY id")?;
    let roadmaps = stmt
        .query_map([], roadmap_from_row)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(roadmaps)
}

fn query_items(conn: &Connection, roadmap_id: Option<i64>) -> Result<Vec<RoadmapItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, roadmap_id, title, summary, level, study_material
         FROM roadmap_items
         WHERE ?1 IS NULL OR roadmap_id = ?1
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![roadmap_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    rows.into_iter()
        .map(|(id, roadmap_id, title, summary, level, study_material)| {
            Ok(RoadmapItem {
                id,
                roadmap_id,
                title,
                summary,
                level,
                study_material: serde_json::from_str(&study_material)?,
            })
        })
        .collect()
}
