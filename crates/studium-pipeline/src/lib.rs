//! # studium-pipeline
//!
//! Batched material processing for studium.
//!
//! A [`MaterialPipeline`] runs three durable stages per material: text
//! extraction, content analysis, and chunked embedding generation. Chunks
//! are embedded in concurrent windows with a rate-limit pause between
//! windows, transient failures retry with linear backoff, and every stage
//! leaves an auditable task record.

pub mod batch;
pub mod pipeline;
pub mod prompts;
pub mod retry;

pub use batch::{process_in_windows, BatchConfig};
pub use pipeline::MaterialPipeline;
pub use retry::{retry_operation, RetryPolicy};
