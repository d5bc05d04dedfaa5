//! Scripted chat model for tests.
//!
//! Replies are chosen by the first rule whose needle occurs in the last
//! message, so tests can script each workflow prompt independently.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::model::{ChatMessage, ChatModel};
use super::prompts::PromptKind;
use crate::error::LlmError;

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: MockReply,
}

/// Mock chat model returning scripted replies.
#[derive(Debug, Clone, Default)]
pub struct MockChatModel {
    rules: Arc<Mutex<Vec<Rule>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockChatModel {
    /// Create a mock with no rules. Unmatched prompts fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` to prompts containing `needle`.
    pub fn on(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        locked(&self.rules).push(Rule {
            needle: needle.into(),
            reply: MockReply::Text(reply.into()),
        });
        self
    }

    /// Reply with `reply` to every rendering of `kind`.
    pub fn on_prompt(self, kind: PromptKind, reply: impl Into<String>) -> Self {
        self.on(kind.marker(), reply)
    }

    /// Fail prompts containing `needle` with an API error.
    pub fn fail_on(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        locked(&self.rules).push(Rule {
            needle: needle.into(),
            reply: MockReply::Fail(message.into()),
        });
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        locked(&self.prompts).len()
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        locked(&self.prompts).clone()
    }

    /// Number of prompts received that contain `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        locked(&self.prompts)
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        locked(&self.prompts).push(prompt.clone());

        let reply = locked(&self.rules)
            .iter()
            .find(|rule| prompt.contains(&rule.needle))
            .map(|rule| rule.reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(message)) => Err(LlmError::Api {
                status: 500,
                message,
            }),
            None => Err(LlmError::Api {
                status: 404,
                message: "no scripted reply".to_string(),
            }),
        }
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}
