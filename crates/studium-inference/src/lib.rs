//! # studium-inference
//!
//! Inference backend abstraction for studium.
//!
//! This crate provides:
//! - Ollama implementation of the generation and embedding backends
//! - Deterministic mock backend for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use studium_inference::OllamaBackend;
//! use studium_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OllamaBackend::from_env().unwrap();
//!     let texts = vec!["Hello".to_string()];
//!     let embeddings = backend.embed_texts(&texts).await.unwrap();
//!     assert_eq!(embeddings.len(), 1);
//! }
//! ```

pub mod mock;
pub mod ollama;

pub use mock::MockInferenceBackend;
pub use ollama::OllamaBackend;
