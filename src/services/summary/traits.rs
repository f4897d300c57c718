use std::future::Future;
use std::pin::Pin;

use super::error::ProviderError;
use super::types::{Completion, CompletionRequest};

pub type ProviderBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A hosted chat-completion endpoint. One call per candidate model; the
/// implementation must not retry on its own.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderBoxFuture<'a, Result<Completion, ProviderError>>;
}
