/// Capability seams for the external AI services.
///
/// The analysis pipelines only ever see these traits. Concrete adapters live next to the
/// clients they wrap (`openai::ChatModel`, `openai::OpenAiEmbedder`, `embedding::Embedder`)
/// and are chosen once at startup, then passed in as `Arc<dyn ...>`.
use async_trait::async_trait;

use crate::error::CommonError;

/// Text-in / text-out generation. One prompt, one reply, no conversation state.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CommonError>;
}

/// Dense text embeddings for semantic retrieval.
///
/// Implementations apply whatever document/query prefixes their model expects, so
/// callers pass raw text to both methods.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of documents. The result has one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError>;

    /// Embed a single retrieval query.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError>;
}
