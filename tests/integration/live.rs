//! Tests against a live Azure OpenAI deployment.
//!
//! These tests require AZURE_API_KEY, AZURE_API_BASE and
//! AZURE_COMPLETION_DEPLOYMENT.

use crossborder_llm::config::Config;
use crossborder_llm::llm::{AzureOpenAiClient, ChatMessage, ChatModel};
use crossborder_llm::workflow::Workflow;
use std::sync::Arc;

/// Get a test config from environment.
fn test_config() -> Option<Config> {
    let config = Config::load().ok()?;
    if !config.llm_configured() {
        return None;
    }
    Some(config)
}

#[tokio::test]
#[ignore = "requires AZURE_API_KEY"]
async fn test_completion_round_trip() {
    let Some(config) = test_config() else {
        println!("Skipping: Azure OpenAI not configured");
        return;
    };
    let client = AzureOpenAiClient::from_config(&config).expect("client");

    let reply = client
        .complete(&[ChatMessage::user("Reply with the single word: pong")])
        .await
        .expect("completion");

    println!("Reply: {}", reply);
    assert!(!reply.trim().is_empty());
}

#[tokio::test]
#[ignore = "requires AZURE_API_KEY"]
async fn test_intent_analysis() {
    let Some(config) = test_config() else {
        println!("Skipping: Azure OpenAI not configured");
        return;
    };
    let client = AzureOpenAiClient::from_config(&config).expect("client");
    let workflow = Workflow::new(Arc::new(client));

    let analysis = workflow
        .analyze_intent(
            Some("Re: Collaboration"),
            "Thanks for reaching out! Could you send me your rate card and product samples?",
        )
        .await
        .expect("intent analysis");

    println!("Intent: {:?}", analysis);
    assert!(!analysis.cooperation_intent.is_empty());
}
