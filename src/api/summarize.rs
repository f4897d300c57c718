use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use super::{error_response, AppState};
use crate::core::validation::is_blank;
use crate::services::summary::classify::ErrorCategory;
use crate::services::summary::SummaryFailure;

pub fn router() -> Router<AppState> {
    Router::new().route("/summarize", post(summarize))
}

/// Pulls `content` out of the body. Anything that is not a JSON object with
/// that key counts as missing content.
fn extract_content(body: &[u8]) -> Result<Option<String>, String> {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Ok(None);
    };
    match value.get("content") {
        None => Ok(None),
        Some(Value::String(content)) => Ok(Some(content.clone())),
        Some(_) => Err("content must be a string".to_string()),
    }
}

async fn summarize(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let content = match extract_content(&body) {
        Ok(Some(content)) => content,
        Ok(None) => return error_response(ErrorCategory::Validation, "No content provided"),
        Err(err) => {
            return error_response(ErrorCategory::Internal, format!("Error generating summary: {err}"))
        }
    };

    if is_blank(&content) {
        return error_response(ErrorCategory::Validation, "Content is empty");
    }

    match state.summarizer.summarize(&content).await {
        Ok(outcome) => {
            info!(model = %outcome.model, truncated = outcome.truncated, "summary.returned");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "summary": outcome.summary
                })),
            )
        }
        Err(failure) => failure_response(failure),
    }
}

fn failure_response(failure: SummaryFailure) -> (StatusCode, Json<Value>) {
    let SummaryFailure { category, error: err } = failure;
    error!(category = category.as_str(), error = %err, "summary.failed");
    match category {
        ErrorCategory::RateLimit => {
            error_response(category, "API rate limit exceeded. Please try again later.")
        }
        ErrorCategory::Authentication => {
            error_response(category, "API authentication failed. Please check your API key.")
        }
        _ => error_response(ErrorCategory::Upstream, format!("API error: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::extract_content;
    use crate::api::tests::{app_with, json_body};
    use crate::services::summary::engine::tests::ScriptedProvider;

    fn summarize_request(body: String) -> Request<Body> {
        Request::post("/summarize")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(provider: Arc<ScriptedProvider>, body: String) -> (StatusCode, serde_json::Value) {
        let response = app_with(provider).oneshot(summarize_request(body)).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[test]
    fn content_extraction_is_lenient() {
        assert_eq!(extract_content(b"not json"), Ok(None));
        assert_eq!(extract_content(b"[1,2]"), Ok(None));
        assert_eq!(extract_content(br#"{"text":"x"}"#), Ok(None));
        assert_eq!(extract_content(br#"{"content":"x"}"#), Ok(Some("x".to_string())));
        assert!(extract_content(br#"{"content":42}"#).is_err());
    }

    #[tokio::test]
    async fn returns_first_successful_summary() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("A short summary.")]));
        let (status, body) = send(provider.clone(), json!({"content": "Long text"}).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "summary": "A short summary."}));
        assert_eq!(provider.models_called(), vec!["best-model"]);
    }

    #[tokio::test]
    async fn falls_back_to_third_candidate() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err("model_decommissioned"),
            Err("service unavailable"),
            Ok("from the third"),
        ]));
        let (status, body) = send(provider.clone(), json!({"content": "Long text"}).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "from the third");
        assert_eq!(provider.models_called(), vec!["best-model", "instant-model", "alt-model"]);
    }

    #[tokio::test]
    async fn null_model_content_is_returned_as_null() {
        let provider = Arc::new(ScriptedProvider::null_content());
        let (status, body) = send(provider, json!({"content": "Long text"}).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "summary": null}));
    }

    #[tokio::test]
    async fn missing_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (status, body) = send(provider.clone(), json!({"text": "x"}).to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No content provided");
        assert!(provider.models_called().is_empty());
    }

    #[tokio::test]
    async fn unparsable_body_is_missing_content() {
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), "{oops".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No content provided");
    }

    #[tokio::test]
    async fn blank_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (status, body) = send(provider.clone(), json!({"content": " \n\t"}).to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Content is empty");
        assert!(provider.models_called().is_empty());
    }

    #[tokio::test]
    async fn non_string_content_is_unexpected() {
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), json!({"content": 7}).to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error generating summary: content must be a string");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_429() {
        let provider = Arc::new(ScriptedProvider::failing("Rate limit reached for model", 3));
        let (status, body) = send(provider, json!({"content": "text"}).to_string()).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "API rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn api_key_maps_to_401() {
        let provider = Arc::new(ScriptedProvider::failing("Invalid API Key", 3));
        let (status, body) = send(provider, json!({"content": "text"}).to_string()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "API authentication failed. Please check your API key.");
    }

    #[tokio::test]
    async fn other_failures_pass_the_message_through() {
        let provider = Arc::new(ScriptedProvider::failing("model overloaded", 3));
        let (status, body) = send(provider, json!({"content": "text"}).to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("API error: "));
        assert!(error.contains("model overloaded"));
    }
}
