#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("Error code: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("response contained no choices")]
    EmptyResponse,
    #[error("Failed to get response from any model")]
    NoResponse,
}
