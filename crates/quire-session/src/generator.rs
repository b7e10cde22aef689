//! Text generation collaborator
//!
//! The model behind the analysis workflow is an external service. Sessions
//! only see [`TextGenerator`]; HTTP clients live outside this workspace.

use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One request to the text generator
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Role instructions
    pub system: String,
    /// Request body
    pub user: String,
    pub temperature: f32,
}

/// Generator failure as reported by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct GenerationError(pub String);

/// Produces a reply for a prompt
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}

/// Replays queued replies in order and records the prompts it was given
///
/// Used for offline runs and tests.
#[derive(Debug, Default)]
pub struct CannedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl CannedGenerator {
    /// Create generator with no replies queued
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    #[must_use]
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(reply.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.replies
            .get_mut()
            .push_back(Err(GenerationError(message.into())));
        self
    }

    /// Prompts received so far
    pub async fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().await.clone()
    }

    /// Replies not yet handed out
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }
}

#[async_trait::async_trait]
impl TextGenerator for CannedGenerator {
    async fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.prompts.lock().await.push(prompt.clone());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError("no canned reply left".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(user: &str) -> Prompt {
        Prompt {
            system: String::new(),
            user: user.to_string(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let generator = CannedGenerator::new().with_reply("one").with_failure("quota");
        assert_eq!(generator.complete(&prompt("a")).await.unwrap(), "one");
        assert_eq!(
            generator.complete(&prompt("b")).await.unwrap_err(),
            GenerationError("quota".to_string())
        );
        assert!(generator.complete(&prompt("c")).await.is_err());
        let users: Vec<String> = generator.prompts().await.into_iter().map(|p| p.user).collect();
        assert_eq!(users, vec!["a", "b", "c"]);
    }
}
