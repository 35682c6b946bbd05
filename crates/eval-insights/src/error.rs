use eval_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid chunking parameters: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("cannot build a semantic index from zero segments")]
    EmptyIndex,

    #[error("guideline retrieval failed: {0}")]
    Retrieval(#[source] CommonError),

    #[error("generation request failed: {0}")]
    Generation(#[source] CommonError),

    #[error("malformed generation output: {0}")]
    MalformedOutput(String),
}
