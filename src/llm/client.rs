//! Azure OpenAI chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::model::{ChatMessage, ChatModel};
use crate::config::Config;
use crate::error::LlmError;
use crate::metrics;

/// Azure OpenAI chat completions client.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Fully qualified chat completions URL.
    endpoint: String,
    /// Resource API key.
    api_key: String,
    /// Deployment name.
    deployment: String,
    /// Sampling temperature.
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The assistant message.
    pub message: ChoiceMessage,
}

/// Message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Reply text; absent when the reply was filtered.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl AzureOpenAiClient {
    /// Create a client from config. Fails with [`LlmError::NotConfigured`]
    /// when the Azure settings are incomplete.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let (Some(api_key), Some(base), Some(deployment)) = (
            config.azure_api_key.as_ref(),
            config.azure_api_base.as_ref(),
            config.azure_completion_deployment.as_ref(),
        ) else {
            return Err(LlmError::NotConfigured);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            endpoint: completions_url(base, deployment, &config.azure_api_version),
            api_key: api_key.clone(),
            deployment: deployment.clone(),
            temperature: config.llm_temperature,
        })
    }

    /// The chat completions URL this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            messages,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        first_choice_content(completion)
    }
}

#[async_trait]
impl ChatModel for AzureOpenAiClient {
    #[instrument(skip(self, messages), fields(deployment = %self.deployment, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        metrics::inc_llm_calls();
        let timer = metrics::timer_llm();

        let result = self.send(messages).await;
        match &result {
            Ok(content) => debug!(
                elapsed_ms = timer.elapsed_ms(),
                chars = content.len(),
                "Completion received"
            ),
            Err(e) => {
                metrics::inc_llm_failures();
                warn!(error = %e, "Completion failed");
            }
        }
        result
    }

    fn model_id(&self) -> &str {
        &self.deployment
    }
}

/// Build the deployment chat completions URL.
pub fn completions_url(base: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        base.trim_end_matches('/'),
        deployment,
        api_version
    )
}

/// Extract the text of the first choice.
pub fn first_choice_content(response: ChatCompletionResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyCompletion)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.and_then(|e| e.message).or(env.message))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "unknown API error".to_string()
            } else {
                body.chars().take(200).collect()
            }
        })
}
