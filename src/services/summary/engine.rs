use std::sync::Arc;

use tracing::{info, warn};

use super::classify::{classify_by_message, ErrorCategory, ErrorClassifier};
use super::error::ProviderError;
use super::prompt::{build_summary_prompt, SummaryPrompt};
use super::traits::CompletionProvider;
use super::types::{
    ChatMessage, Completion, CompletionRequest, ModelCandidates, SummaryOutcome, SUMMARY_MAX_TOKENS,
    SUMMARY_TEMPERATURE,
};

/// Walks the candidates in order and returns the first completion. Failures
/// before the last candidate are logged and skipped; the last one is returned.
pub async fn complete_with_fallback(
    provider: &dyn CompletionProvider,
    candidates: &ModelCandidates,
    messages: &[ChatMessage],
) -> Result<Completion, ProviderError> {
    let models = candidates.as_slice();
    let mut completion = None;

    for (idx, model) in models.iter().enumerate() {
        let is_last = idx + 1 == models.len();
        let request = CompletionRequest {
            model: model.clone(),
            messages: messages.to_vec(),
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        };

        info!(model = %model, attempt = idx + 1, of = models.len(), "summary.candidate.start");
        match provider.complete(request).await {
            Ok(value) => {
                completion = Some(value);
                break;
            }
            Err(err) if !is_last => {
                warn!(model = %model, error = %err, "summary.candidate.failed, trying next model");
            }
            Err(err) => {
                warn!(model = %model, error = %err, "summary.candidate.failed, no models left");
                return Err(err);
            }
        }
    }

    completion.ok_or(ProviderError::NoResponse)
}

#[derive(Debug)]
pub struct SummaryFailure {
    pub category: ErrorCategory,
    pub error: ProviderError,
}

/// Builds prompts and calls the provider. Shared by every request; holds no
/// per-request state.
pub struct SummaryService {
    provider: Arc<dyn CompletionProvider>,
    candidates: ModelCandidates,
    classifier: ErrorClassifier,
}

impl SummaryService {
    pub fn new(provider: Arc<dyn CompletionProvider>, candidates: ModelCandidates) -> Self {
        Self {
            provider,
            candidates,
            classifier: classify_by_message,
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// `content` must already be known to be non-blank.
    pub async fn summarize(&self, content: &str) -> Result<SummaryOutcome, SummaryFailure> {
        let SummaryPrompt { messages, truncated } = build_summary_prompt(content);
        if truncated {
            info!(chars = content.chars().count(), "summary.content.truncated");
        }

        match complete_with_fallback(self.provider.as_ref(), &self.candidates, &messages).await {
            Ok(completion) => {
                let Completion { model, content: summary, finish_reason } = completion;
                match summary.as_deref() {
                    Some(text) => info!(
                        model = %model,
                        finish_reason = finish_reason.as_deref().unwrap_or("-"),
                        summary_len = text.len(),
                        "summary.completed"
                    ),
                    None => warn!(
                        model = %model,
                        finish_reason = finish_reason.as_deref().unwrap_or("-"),
                        "summary.completed without content"
                    ),
                }
                Ok(SummaryOutcome { summary, model, truncated })
            }
            Err(error) => {
                let category = (self.classifier)(&error.to_string());
                Err(SummaryFailure { category, error })
            }
        }
    }
}
