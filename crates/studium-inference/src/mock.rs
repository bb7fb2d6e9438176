//! Mock inference backend for deterministic testing.
//!
//! Generates reproducible embeddings and scripted generation responses so
//! pipeline behavior can be asserted without a live model server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use studium_core::{EmbeddingBackend, Error, GenerationBackend, Result};

/// Mock backend implementing both [`GenerationBackend`] and
/// [`EmbeddingBackend`].
///
/// Cloning shares configuration and the call log, so a test can keep one
/// handle for assertions while the component under test owns another.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    generate_failures: Arc<AtomicUsize>,
    embed_failures: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    response_mappings: HashMap<String, String>,
    default_response: String,
    latency_ms: u64,
    failure_rate: f64,
}

/// One recorded call against the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: studium_core::defaults::EMBED_DIMENSION,
            response_mappings: HashMap::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
            generate_failures: Arc::new(AtomicUsize::new(0)),
            embed_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the response returned when no mapping matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Return `response` for any prompt containing `needle`.
    ///
    /// Mappings are checked in insertion-independent order; tests should use
    /// needles that cannot match more than one prompt.
    pub fn with_response_for(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .response_mappings
            .insert(needle.into(), response.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set random failure rate (0.0 to 1.0).
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Script the next `n` generation calls to fail, then succeed.
    pub fn with_generate_failures(self, n: usize) -> Self {
        self.generate_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Script the next `n` embedding calls to fail, then succeed.
    pub fn with_embed_failures(self, n: usize) -> Self {
        self.embed_failures.store(n, Ordering::SeqCst);
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    pub fn generate_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "generate")
            .count()
    }

    pub fn embed_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "embed")
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    fn consume_scripted_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn should_fail_randomly(&self) -> bool {
        use rand::Rng;
        self.config.failure_rate > 0.0
            && rand::thread_rng().gen::<f64>() < self.config.failure_rate
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    /// Deterministic embedding from text content.
    ///
    /// Character-based hashing, normalized to unit length. The same text
    /// always produces the same vector.
    pub fn embedding_for(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension.max(1)];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % vec.len();
            vec[idx] += 0.1;
        }
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.log_call("generate", prompt);
        self.simulate_latency().await;

        if Self::consume_scripted_failure(&self.generate_failures) || self.should_fail_randomly() {
            return Err(Error::Inference("simulated generation failure".to_string()));
        }

        for (needle, response) in &self.config.response_mappings {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.config.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        for text in texts {
            self.log_call("embed", text);
        }
        self.simulate_latency().await;

        if Self::consume_scripted_failure(&self.embed_failures) || self.should_fail_randomly() {
            return Err(Error::Embedding("simulated embedding failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|t| Self::embedding_for(t, self.config.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let backend = MockInferenceBackend::new();
        let texts = vec!["quantum computing".to_string()];

        let e1 = backend.embed_texts(&texts).await.unwrap();
        let e2 = backend.embed_texts(&texts).await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn embeddings_respect_dimension() {
        let backend = MockInferenceBackend::new().with_dimension(128);
        let out = backend
            .embed_texts(&["test".to_string()])
            .await
            .unwrap();
        assert_eq!(out[0].len(), 128);
        assert_eq!(backend.dimension(), 128);
    }

    #[test]
    fn embeddings_are_normalized() {
        let vec = MockInferenceBackend::embedding_for("test", 64);
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn response_mapping_matches_substring() {
        let backend = MockInferenceBackend::new()
            .with_response_for("extract", "extracted text")
            .with_default_response("fallback");

        let mapped = backend
            .generate("Please extract the key content")
            .await
            .unwrap();
        assert_eq!(mapped, "extracted text");

        let fallback = backend.generate("something else").await.unwrap();
        assert_eq!(fallback, "fallback");
    }

    #[tokio::test]
    async fn scripted_failures_then_success() {
        let backend = MockInferenceBackend::new()
            .with_generate_failures(2)
            .with_default_response("ok");

        assert!(backend.generate("p").await.is_err());
        assert!(backend.generate("p").await.is_err());
        assert_eq!(backend.generate("p").await.unwrap(), "ok");
        assert_eq!(backend.generate_call_count(), 3);
    }

    #[tokio::test]
    async fn scripted_embed_failures_are_independent() {
        let backend = MockInferenceBackend::new().with_embed_failures(1);

        assert_eq!(backend.generate("p").await.unwrap(), "Mock response");
        assert!(backend.embed_texts(&["t".to_string()]).await.is_err());
        assert!(backend.embed_texts(&["t".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn call_log_records_every_input() {
        let backend = MockInferenceBackend::new();
        backend
            .embed_texts(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        backend.generate("prompt").await.unwrap();

        assert_eq!(backend.embed_call_count(), 2);
        assert_eq!(backend.generate_call_count(), 1);
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn full_failure_rate_always_fails() {
        let backend = MockInferenceBackend::new().with_failure_rate(1.0);
        assert!(backend.generate("p").await.is_err());
        assert!(backend.embed_texts(&["t".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn clones_share_call_log() {
        let backend = MockInferenceBackend::new();
        let observer = backend.clone();
        backend.generate("p").await.unwrap();
        assert_eq!(observer.generate_call_count(), 1);
    }
}
