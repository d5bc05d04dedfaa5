//! LLM access: the chat model trait, the Azure OpenAI client, prompt
//! templates and JSON output parsing.

pub mod client;
pub mod mock;
pub mod model;
pub mod output;
pub mod prompts;

pub use client::AzureOpenAiClient;
pub use mock::MockChatModel;
pub use model::{invoke_json, ChatMessage, ChatModel, Role};
pub use output::parse_json_output;
pub use prompts::PromptKind;
