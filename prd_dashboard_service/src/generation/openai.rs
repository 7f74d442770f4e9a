//! Chat-completions client for OpenAI-compatible endpoints.

use std::{env, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::CallError,
    generation::{
        provider::CompletionProvider,
        types::{GenerationRequest, GenerationResponse},
    },
};

/// Where the bearer token comes from.
#[derive(Debug, Clone)]
pub enum ApiKey {
    /// Looked up in the process environment on every call.
    Env(String),
    Fixed(String),
}

impl ApiKey {
    fn resolve(&self) -> Result<String, CallError> {
        let (key, name) = match self {
            ApiKey::Env(var) => (env::var(var).ok(), var.as_str()),
            ApiKey::Fixed(value) => (Some(value.clone()), "api key"),
        };
        key.filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CallError::MissingCredential(name.to_string()))
    }
}

pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: ApiKey,
}

#[derive(Deserialize)]
struct ChatCompletion {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        let api_key = self.api_key.resolve()?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                CallError::RateLimited(message)
            } else {
                CallError::Service(message)
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| CallError::Service(format!("invalid completion body: {e}")))?;

        let (content, finish_reason) = match completion.choices.into_iter().next() {
            Some(choice) => (
                choice.message.content.unwrap_or_default(),
                choice.finish_reason,
            ),
            None => (String::new(), None),
        };

        Ok(GenerationResponse {
            content,
            model: completion.model,
            finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn has_credential(&self) -> bool {
        self.api_key.resolve().is_ok()
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{status}: {}", envelope.error.message),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", body.trim()),
    }
}
