use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Encoding,
    RateLimit,
    Authentication,
    Upstream,
    Internal,
}

impl ErrorCategory {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCategory::Validation | ErrorCategory::Encoding => StatusCode::BAD_REQUEST,
            ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
            ErrorCategory::Upstream | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Encoding => "encoding",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// Maps a provider failure message to a category.
pub type ErrorClassifier = fn(&str) -> ErrorCategory;

/// Substring sniffing on the provider's wording. Rate limiting wins over
/// authentication when both appear.
pub fn classify_by_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") {
        ErrorCategory::RateLimit
    } else if lower.contains("authentication") || lower.contains("api key") {
        ErrorCategory::Authentication
    } else {
        ErrorCategory::Upstream
    }
}
