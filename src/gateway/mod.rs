//! LLM Gateway.
//!
//! A single call boundary — `CompletePrompt` — sits between the core and
//! whatever LLM provider SDK the caller wires in. The core never retries
//! a transport failure; a failure on the first call is surfaced to the
//! caller, a failure on the repair call is swallowed.

use async_trait::async_trait;

/// One request to the underlying model: a system message, a user
/// message, and a token budget.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// The outcome of a `completePrompt` call.
#[derive(Debug, Clone)]
pub enum CompletionResult {
    Completed(String),
    Failed(String),
}

impl CompletionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionResult::Completed(_))
    }
}

/// The collaborator boundary the core calls through. Implementations are
/// free to wrap any provider SDK; the core is agnostic to which one.
#[async_trait]
pub trait CompletePrompt: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> CompletionResult;
}

/// Transparent wrapper that tallies input/output character counts at
/// `tracing` debug level when wrapping another [`CompletePrompt`].
pub struct InstrumentedCompletePrompt<C> {
    inner: C,
}

impl<C: CompletePrompt> InstrumentedCompletePrompt<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: CompletePrompt> CompletePrompt for InstrumentedCompletePrompt<C> {
    async fn complete(&self, request: CompletionRequest) -> CompletionResult {
        let input_chars = request.system.len() + request.prompt.len();
        tracing::debug!(input_chars, max_tokens = request.max_tokens, "completePrompt: request");
        let result = self.inner.complete(request).await;
        match &result {
            CompletionResult::Completed(value) => {
                tracing::debug!(output_chars = value.len(), "completePrompt: response");
            }
            CompletionResult::Failed(error) => {
                tracing::debug!(error = %error, "completePrompt: transport failure");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl CompletePrompt for Echo {
        async fn complete(&self, request: CompletionRequest) -> CompletionResult {
            CompletionResult::Completed(request.prompt)
        }
    }

    #[tokio::test]
    async fn instrumented_wrapper_passes_through_result() {
        let gateway = InstrumentedCompletePrompt::new(Echo);
        let result = gateway
            .complete(CompletionRequest {
                system: "sys".to_string(),
                prompt: "hello".to_string(),
                max_tokens: 100,
            })
            .await;
        match result {
            CompletionResult::Completed(text) => assert_eq!(text, "hello"),
            CompletionResult::Failed(_) => panic!("expected completion"),
        }
    }
}
