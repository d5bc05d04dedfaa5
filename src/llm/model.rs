//! Chat model abstraction shared by the real client and the mock.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::output::parse_json_output;
use super::prompts::PromptKind;
use crate::error::LlmError;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user turn.
    User,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the assistant reply for `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Identifier of the model or deployment.
    fn model_id(&self) -> &str;
}

/// Render `kind` with `vars` and parse the reply as JSON.
///
/// The first line of the prompt (the persona) is sent as the system turn,
/// the rest as the user turn.
pub async fn invoke_json<T: DeserializeOwned>(
    model: &dyn ChatModel,
    kind: PromptKind,
    vars: &[(&str, &str)],
) -> Result<T, LlmError> {
    let reply = model.complete(&prompt_messages(&kind.render(vars))).await?;
    parse_json_output(&reply)
}

fn prompt_messages(prompt: &str) -> Vec<ChatMessage> {
    match prompt.split_once('\n') {
        Some((persona, task)) => vec![ChatMessage::system(persona), ChatMessage::user(task)],
        None => vec![ChatMessage::user(prompt)],
    }
}
