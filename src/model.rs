//! External model client for transcription and text transforms.
//!
//! The endpoints depend on one capability: send a prompt (with an optional
//! image payload) to the model, get text back or fail. [`ModelClient`] keeps
//! that seam substitutable in tests; [`OpenRouterClient`] is the real thing.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// One round trip to the model. Returns the trimmed response text; a
    /// missing credential, transport failure or empty reply is an error.
    async fn generate(&self, prompt: &str, image_png: Option<&[u8]>) -> Result<String>;
}

/// OpenRouter chat-completions client.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    /// Read credentials from the environment. A missing key is not an error
    /// here: each call fails at request time with a descriptive message.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENROUTER_API_KEY")
            .or_else(|_| env::var("OPENROUTER_KEY"))
            .ok();
        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, OPENROUTER_API_URL.to_string(), model)
    }

    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    async fn send_request(&self, request: ChatCompletionRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENROUTER_API_KEY environment variable not set")?;

        debug!("Sending request to OpenRouter: model={}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenRouter")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter API error ({}): {}", status, error_text);
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        if let Some(usage) = &response.usage {
            info!(
                "OpenRouter response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("Model returned an empty response");
        }
        Ok(content.to_string())
    }
}

#[async_trait::async_trait]
impl ModelClient for OpenRouterClient {
    async fn generate(&self, prompt: &str, image_png: Option<&[u8]>) -> Result<String> {
        let message = match image_png {
            Some(png) => Message::user_with_image(prompt, png),
            None => Message::user(prompt),
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![message],
            max_tokens: Some(8192),
        };

        self.send_request(request).await
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Message types
// ============================================================================

#[derive(Debug, Serialize)]
struct Message {
    role: Role,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// User message carrying the prompt plus the PNG as a base64 data URL.
    fn user_with_image(text: impl Into<String>, png: &[u8]) -> Self {
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(png));
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        }
    }
}
