//! OpenAI-compatible chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{CompletionClient, CompletionRequest};
use crate::errors::CompletionError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "PAGEAUDIT_API_KEY";

/// Connection settings for [`HttpCompletionClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCompletionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl Default for HttpCompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: 2048,
        }
    }
}

/// Chat-completions client. A missing API key is only reported when a
/// request is made, so constructing the client never fails on credentials.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    config: HttpCompletionConfig,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(config: HttpCompletionConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build a client whose key comes from the environment variable named in
    /// `config.api_key_env`.
    pub fn from_env(config: HttpCompletionConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(config, api_key)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn config(&self) -> &HttpCompletionConfig {
        &self.config
    }
}

/// Request body in chat-completions format.
pub(crate) fn build_body(config: &HttpCompletionConfig, request: &CompletionRequest) -> Value {
    let content = if request.use_vision && !request.images.is_empty() {
        let mut parts = vec![json!({ "type": "text", "text": request.prompt })];
        parts.extend(request.images.iter().map(|image| {
            json!({
                "type": "image_url",
                "image_url": { "url": image.data_url() }
            })
        }));
        Value::Array(parts)
    } else {
        Value::String(request.prompt.clone())
    };

    json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "messages": [{ "role": "user", "content": content }]
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's text from a chat-completions response body.
pub(crate) fn parse_response(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Malformed(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(CompletionError::EmptyResponse)
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::MissingCredential {
                env_var: self.config.api_key_env.clone(),
            })?;

        let body = build_body(&self.config, &request);
        tracing::debug!(
            model = %self.config.model,
            vision = request.use_vision,
            images = request.images.len(),
            prompt_chars = request.prompt.len(),
            "sending completion request"
        );

        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("User-Agent", "pageaudit")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: crate::util::truncate_chars(&text, 500).to_string(),
            });
        }

        parse_response(&text)
    }

    fn describe(&self) -> String {
        self.config.model.clone()
    }
}
