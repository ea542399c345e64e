//! Learning roadmaps: topics broken into titled items, each with a quiz.
//!
//! This is plain CRUD over the `roadmaps`, `roadmap_items`, `quiz_questions`
//! and `quiz_progress` tables; the knowledge graph in [`crate::graph`] is
//! derived from the first two.

mod progress;
mod seed;
mod store;

pub use progress::{
    completed_items, record_completion, CompletionRequest, CompletionResult, UserProgress, DEFAULT_USER,
};
pub use seed::{seed_demo_data, SeedSummary};
pub use store::{
    create_roadmap, get_quiz, get_roadmap, list_items, list_roadmaps, list_roadmaps_with_items,
};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadmapError};

/// A learning topic at a given experience level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: i64,
    pub topic: String,
    pub experience: String,
    /// RFC 3339 creation time.
    pub created_at: String,
}

/// One titled step of a roadmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: i64,
    pub roadmap_id: i64,
    pub title: String,
    pub summary: String,
    pub level: i64,
    /// Study material URLs.
    pub study_material: Vec<String>,
}

/// Roadmap together with its items, as listed by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapWithItems {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    pub items: Vec<RoadmapItem>,
}

/// A multiple-choice question attached to a roadmap item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub roadmap_item_id: i64,
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct: usize,
}

/// The quiz for one roadmap item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub roadmap_item_id: i64,
    pub questions: Vec<QuizQuestion>,
}

/// Request body for creating a roadmap.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoadmap {
    pub topic: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub items: Vec<NewRoadmapItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoadmapItem {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_level")]
    pub level: i64,
    #[serde(default)]
    pub study_material: Vec<String>,
    #[serde(default)]
    pub questions: Vec<NewQuizQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
}

fn default_level() -> i64 {
    1
}

impl NewRoadmap {
    /// Reject roadmaps the quiz and graph views cannot render.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(RoadmapError::InvalidInput("topic must not be empty".to_string()));
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.title.trim().is_empty() {
                return Err(RoadmapError::InvalidInput(format!(
                    "item {} has an empty title",
                    i
                )));
            }
            for (j, q) in item.questions.iter().enumerate() {
                if q.options.len() < 2 {
                    return Err(RoadmapError::InvalidInput(format!(
                        "item {} question {} needs at least two options",
                        i, j
                    )));
                }
                if q.correct >= q.options.len() {
                    return Err(RoadmapError::InvalidInput(format!(
                        "item {} question {}: correct index {} out of range",
                        i, j, q.correct
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: usize) -> NewQuizQuestion {
        NewQuizQuestion {
            question: "q".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct,
        }
    }

    fn roadmap_with(questions: Vec<NewQuizQuestion>) -> NewRoadmap {
        NewRoadmap {
            topic: "Rust".to_string(),
            experience: String::new(),
            items: vec![NewRoadmapItem {
                title: "Ownership".to_string(),
                summary: String::new(),
                level: 1,
                study_material: vec![],
                questions,
            }],
        }
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(roadmap_with(vec![question(&["a", "b"], 1)]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_correct_index() {
        let err = roadmap_with(vec![question(&["a", "b"], 2)]).validate().unwrap_err();
        assert!(matches!(err, RoadmapError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_single_option_and_blank_topic() {
        assert!(roadmap_with(vec![question(&["a"], 0)]).validate().is_err());

        let mut blank = roadmap_with(vec![]);
        blank.topic = "  ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_roadmap_with_items_serializes_flat() {
        let value = serde_json::to_value(RoadmapWithItems {
            roadmap: Roadmap {
                id: 1,
                topic: "Rust".to_string(),
                experience: "Beginner".to_string(),
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
            items: vec![],
        })
        .unwrap();
        assert_eq!(value["topic"], "Rust");
        assert!(value["items"].as_array().unwrap().is_empty());
    }
}
