//! Generative model access: prompt in, schema-constrained JSON text out.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A model that answers a prompt with JSON matching `response_schema`.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the raw JSON text produced by the model.
    async fn generate_json(&self, prompt: &str, response_schema: &Value) -> Result<String>;

    /// Model name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::RoadmapError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned model used by graph and API tests.
    pub struct StubModel {
        reply: std::result::Result<String, String>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl StubModel {
        pub fn replying(json: &str) -> Self {
            Self::with(Ok(json.to_string()))
        }

        pub fn failing(message: &str) -> Self {
            Self::with(Err(message.to_string()))
        }

        fn with(reply: std::result::Result<String, String>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for StubModel {
        async fn generate_json(&self, prompt: &str, _response_schema: &Value) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone().map_err(RoadmapError::Ai)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }
}
