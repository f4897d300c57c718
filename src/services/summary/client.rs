use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use super::error::ProviderError;
use super::traits::{CompletionProvider, ProviderBoxFuture};
use super::types::{Completion, CompletionRequest};

const MAX_LOGGED_ERROR_LEN: usize = 2000;

/// OpenAI-compatible `/chat/completions` client, built once at startup.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Request)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    async fn send(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        info!("[AI] completion start: model={}, baseURL={}", request.model, self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            error!(
                "[AI] request failed: model={}, status={}, error={}",
                request.model,
                status,
                truncate_log(&message, MAX_LOGGED_ERROR_LEN)
            );
            return Err(ProviderError::Api { status: status.as_u16(), message });
        }

        let body: ChatResponse = resp.json().await.map_err(|e| self.map_transport_error(e))?;
        let choice = body.choices.into_iter().next().ok_or(ProviderError::EmptyResponse)?;

        Ok(Completion {
            model: body.model.unwrap_or(request.model),
            content: choice.message.content,
            finish_reason: choice.finish_reason,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout.as_secs())
        } else {
            ProviderError::Request(err)
        }
    }
}

impl CompletionProvider for ChatCompletionsClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderBoxFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(self.send(request))
    }
}

fn truncate_log(value: &str, max_len: usize) -> String {
    match value.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...[truncated]", &value[..idx]),
        None => value.to_string(),
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
