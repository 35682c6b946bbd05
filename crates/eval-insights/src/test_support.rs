/// Hand-written stand-ins for the external AI capabilities.

use std::sync::Mutex;

use async_trait::async_trait;
use eval_common::capability::{EmbeddingProvider, TextGenerator};
use eval_common::error::CommonError;

type ReplyFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Answers every prompt through a closure and remembers the prompts it saw.
pub struct StubGenerator {
    reply: ReplyFn,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn always(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::with(move |_| reply.clone())
    }

    pub fn with(reply: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CommonError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok((self.reply)(prompt))
    }
}

/// Generation endpoint that is down.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, CommonError> {
        Err(CommonError::Generation("upstream returned 503".to_string()))
    }
}

/// Deterministic embedder: one dimension per keyword holding its occurrence count, plus
/// a constant dimension so no vector is all zeros.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect();
        vector.push(0.01);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        Ok(self.embed(query))
    }
}

/// Embedding backend that cannot be reached.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        Err(CommonError::Embedding("model not loaded".to_string()))
    }

    async fn embed_query(&self, _query: &str) -> Result<Vec<f32>, CommonError> {
        Err(CommonError::Embedding("model not loaded".to_string()))
    }
}
