//! Static demo content: two roadmaps with quizzes and a curated graph snapshot.

use chrono::Utc;
use serde::Serialize;

use super::store::insert_roadmap;
use super::{NewQuizQuestion, NewRoadmap, NewRoadmapItem, RoadmapWithItems};
use crate::db::Db;
use crate::error::{Result, RoadmapError};
use crate::graph::{build_base_graph, snapshot, title_node_id, Edge};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedSummary {
    pub roadmaps: usize,
    pub items: usize,
    pub questions: usize,
    pub nodes: usize,
    pub edges: usize,
}

type QuestionSpec = (&'static str, [&'static str; 4], usize);
type ItemSpec = (&'static str, &'static str, i64, [&'static str; 2], [QuestionSpec; 4]);

const PYTHON_ITEMS: [ItemSpec; 3] = [
    (
        "Variables and Data Types",
        "Understanding how to store and manipulate data in Python using variables, strings, numbers, lists, and dictionaries.",
        1,
        ["https://docs.python.org/3/tutorial/introduction.html", "https://realpython.com/python-data-types/"],
        [
            ("Which of these is NOT a Python data type?", ["list", "tuple", "array", "dict"], 2),
            ("How do you create a variable in Python?", ["var x = 5", "x := 5", "x = 5", "int x = 5"], 2),
            ("Which method is used to add an item to a list?", [".add()", ".append()", ".push()", ".insert()"], 1),
            ("What will print(type('hello')) output?", ["<class 'str'>", "<class 'string'>", "'str'", "string"], 0),
        ],
    ),
    (
        "Control Structures",
        "Master conditional statements (if/elif/else) and loops (for/while) to control program flow.",
        1,
        ["https://docs.python.org/3/tutorial/controlflow.html", "https://realpython.com/python-conditional-statements/"],
        [
            ("What keyword is used for conditional statements?", ["when", "if", "condition", "switch"], 1),
            ("Which loop repeats while a condition is true?", ["for", "while", "repeat", "until"], 1),
            ("How do you write an elif statement?", ["else if", "elsif", "elif", "else-and-if"], 2),
            ("What will break do in a loop?", ["Pause", "Exit the loop", "Skip to next iteration", "Restart the loop"], 1),
        ],
    ),
    (
        "Functions",
        "Learn to define reusable code blocks with parameters and return values.",
        2,
        [
            "https://docs.python.org/3/tutorial/controlflow.html#defining-functions",
            "https://realpython.com/defining-your-own-python-function/",
        ],
        [
            ("Which keyword defines a function?", ["function", "def", "fun", "define"], 1),
            ("What does return do in a function?", ["Print output", "Send value back", "End the program", "Pause execution"], 1),
            ("How are function parameters separated?", [";", ":", ",", ":="], 2),
            (
                "What's the difference between a parameter and an argument?",
                [
                    "No difference",
                    "Parameter in definition, argument in call",
                    "Argument in definition, parameter in call",
                    "Only naming convention",
                ],
                1,
            ),
        ],
    ),
];

const ML_ITEMS: [ItemSpec; 3] = [
    (
        "Linear Regression",
        "Understanding the foundational algorithm for predicting continuous values using a straight line model.",
        1,
        [
            "https://scikit-learn.org/stable/modules/linear_model.html",
            "https://towardsdatascience.com/linear-regression-explained-1b36f97b6bfd",
        ],
        [
            ("What does linear regression predict?", ["Categories", "Continuous values", "Images", "Sequences"], 1),
            ("What is the cost function in linear regression?", ["Accuracy", "Mean Squared Error", "Precision", "Recall"], 1),
            (
                "What is gradient descent used for?",
                ["Feature selection", "Parameter optimization", "Data preprocessing", "Model evaluation"],
                1,
            ),
            ("What is R-squared?", ["Error metric", "Accuracy metric", "Both", "Neither"], 2),
        ],
    ),
    (
        "Classification Basics",
        "Learn binary and multi-class classification using algorithms like logistic regression and decision trees.",
        1,
        [
            "https://scikit-learn.org/stable/supervised_learning.html",
            "https://towardsdatascience.com/classification-algorithms-explained-2bafb3239ce6",
        ],
        [
            (
                "What is classification?",
                ["Predicting numbers", "Predicting categories", "Data clustering", "Dimensionality reduction"],
                1,
            ),
            ("What does logistic regression output?", ["Continuous value", "Probability", "Category directly", "Distance"], 1),
            (
                "What is overfitting?",
                ["Underfitting", "Poor generalization", "Good performance on test data", "Simple model"],
                1,
            ),
            (
                "What is a confusion matrix used for?",
                ["Feature scaling", "Model evaluation", "Data visualization", "Hyperparameter tuning"],
                1,
            ),
        ],
    ),
    (
        "Neural Networks",
        "Introduction to artificial neural networks, deep learning concepts, and backpropagation.",
        2,
        ["https://pytorch.org/tutorials/", "https://towardsdatascience.com/neural-networks-explained-7b4f5fd3d67a"],
        [
            ("What is a neuron in ML?", ["Brain cell", "Computational unit", "Data point", "Algorithm"], 1),
            (
                "What is backpropagation?",
                ["Forward pass", "Backward pass for learning", "Data preprocessing", "Prediction step"],
                1,
            ),
            ("What is an activation function?", ["Loss function", "Non-linear transformation", "Optimizer", "Regularizer"], 1),
            ("What makes deep learning 'deep'?", ["Large datasets", "Many layers", "Complex math", "Fast computers"], 1),
        ],
    ),
];

fn demo_roadmap(topic: &str, experience: &str, items: &[ItemSpec]) -> NewRoadmap {
    NewRoadmap {
        topic: topic.to_string(),
        experience: experience.to_string(),
        items: items
            .iter()
            .map(|(title, summary, level, material, questions)| NewRoadmapItem {
                title: title.to_string(),
                summary: summary.to_string(),
                level: *level,
                study_material: material.iter().map(|m| m.to_string()).collect(),
                questions: questions
                    .iter()
                    .map(|(question, options, correct)| NewQuizQuestion {
                        question: question.to_string(),
                        options: options.iter().map(|o| o.to_string()).collect(),
                        correct: *correct,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn demo_roadmaps() -> Vec<NewRoadmap> {
    vec![
        demo_roadmap(
            "Python Programming",
            "Beginner - I know basic programming concepts but new to Python",
            &PYTHON_ITEMS,
        ),
        demo_roadmap(
            "Introduction to Machine Learning",
            "Intermediate - I know Python and statistics basics",
            &ML_ITEMS,
        ),
    ]
}

/// Hand-picked cross-roadmap edges stored with the demo snapshot.
fn curated_edges(python: &RoadmapWithItems, ml: &RoadmapWithItems) -> Vec<Edge> {
    let p = |i: usize| title_node_id(python.items[i].id);
    let m = |i: usize| title_node_id(ml.items[i].id);
    vec![
        Edge::new(p(2), m(2), 2.5, "prerequisite"),
        Edge::new(p(1), m(1), 2.0, "prerequisite"),
        Edge::new(m(0), p(2), 2.2, "complementary"),
    ]
}

/// Wipe all roadmap, progress and snapshot rows, then insert the demo data.
pub async fn seed_demo_data(db: &Db) -> Result<SeedSummary> {
    let roadmaps = demo_roadmaps();
    for roadmap in &roadmaps {
        roadmap.validate()?;
    }

    db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        for table in [
            "quiz_progress",
            "quiz_questions",
            "knowledge_graph_edges",
            "knowledge_graph_nodes",
            "roadmap_items",
            "roadmaps",
        ] {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }

        let now = Utc::now().to_rfc3339();
        let created = roadmaps
            .iter()
            .map(|r| insert_roadmap(&tx, r, &now))
            .collect::<Result<Vec<_>>>()?;
        let [python, ml] = created.as_slice() else {
            return Err(RoadmapError::InvalidInput("demo data must hold two roadmaps".to_string()));
        };

        let all_roadmaps: Vec<_> = created.iter().map(|c| c.roadmap.clone()).collect();
        let all_items: Vec<_> = created.iter().flat_map(|c| c.items.clone()).collect();
        let mut graph = build_base_graph(&all_roadmaps, &all_items);
        graph.merge_edges(curated_edges(python, ml));
        snapshot::write_snapshot(&tx, &graph)?;

        tx.commit()?;

        let summary = SeedSummary {
            roadmaps: created.len(),
            items: all_items.len(),
            questions: roadmaps
                .iter()
                .flat_map(|r| r.items.iter())
                .map(|i| i.questions.len())
                .sum(),
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        };
        log::info!("Database seeded: {:?}", summary);
        Ok(summary)
    })
    .await
}
