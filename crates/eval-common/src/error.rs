/// Error types shared by the evaluation services.
///
/// These errors represent failures in the external AI capabilities (embedding model,
/// text generation endpoint). Service crates decide how each one is classified and
/// wrap `CommonError` in their own error types.
use crate::openai::OpenAiClientError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    OpenAi(#[from] OpenAiClientError),
}
