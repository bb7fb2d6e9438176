//! Three-stage material processing pipeline.
//!
//! Each material runs text extraction, content analysis, and embedding
//! generation in order. Every stage has a durable task record; a stage
//! failure marks its task and the material as errored and later stages never
//! start.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use studium_core::{
    chunk_text, ChunkEmbedding, ContentAnalysis, EmbeddingBackend, EmbeddingRepository, Error,
    GenerationBackend, Material, MaterialRepository, MaterialStatus, ProcessingTask, Result,
    TaskRepository, TaskType,
};

use crate::batch::{process_in_windows, BatchConfig};
use crate::prompts;
use crate::retry::{retry_operation, RetryPolicy};

/// Orchestrates the per-material processing stages.
///
/// All collaborators are injected, so tests can combine the in-memory stores
/// with the mock inference backend.
pub struct MaterialPipeline {
    tasks: Arc<dyn TaskRepository>,
    materials: Arc<dyn MaterialRepository>,
    embeddings: Arc<dyn EmbeddingRepository>,
    generator: Arc<dyn GenerationBackend>,
    embedder: Arc<dyn EmbeddingBackend>,
    batch: BatchConfig,
    retry: RetryPolicy,
}

impl MaterialPipeline {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        materials: Arc<dyn MaterialRepository>,
        embeddings: Arc<dyn EmbeddingRepository>,
        generator: Arc<dyn GenerationBackend>,
        embedder: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            tasks,
            materials,
            embeddings,
            generator,
            embedder,
            batch: BatchConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the batch configuration.
    pub fn with_batch_config(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run all stages for a material.
    ///
    /// The material record is created if it does not exist yet, and a fresh
    /// set of pending stage tasks replaces any earlier set. On success the
    /// material ends `ready`; on the first stage failure it ends `error`
    /// with the failing stage's message.
    #[instrument(skip(self, material), fields(subsystem = "pipeline", material_id = %material.id))]
    pub async fn process_material(&self, material: &Material) -> Result<()> {
        info!(
            content_len = material.content.len(),
            gen_model = self.generator.model_name(),
            embed_model = self.embedder.model_name(),
            "Processing material"
        );

        if self.materials.get(material.id).await?.is_none() {
            self.materials.insert(material).await?;
        } else {
            self.materials
                .set_status(material.id, MaterialStatus::Processing, None)
                .await?;
        }

        for task_type in TaskType::ALL {
            self.tasks
                .upsert(&ProcessingTask::pending(material.id, task_type))
                .await?;
        }

        let extracted = self
            .run_stage(material.id, TaskType::TextExtraction, || {
                self.extract_text(material.id, &material.content)
            })
            .await?;

        let analysis = self
            .run_stage(material.id, TaskType::ContentAnalysis, || {
                self.analyze_content(material.id, &extracted)
            })
            .await?;

        let chunks = self
            .run_stage(material.id, TaskType::EmbeddingGeneration, || {
                self.generate_embeddings(material.id, &extracted)
            })
            .await?;

        let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| c.embedding.clone()).collect();
        self.embeddings.store_chunks(material.id, &chunks).await?;
        self.materials
            .finalize(material.id, &extracted, &analysis.topics, &analysis, vectors)
            .await?;

        info!(
            chunk_count = chunks.len(),
            topic_count = analysis.topics.len(),
            "Material ready"
        );
        Ok(())
    }

    /// All stage tasks for a material, in creation order.
    pub async fn processing_status(&self, material_id: Uuid) -> Result<Vec<ProcessingTask>> {
        self.tasks.list_for_material(material_id).await
    }

    /// Wrap one stage: mark it processing, run it, and record the terminal
    /// state on both the task and (on failure) the material.
    async fn run_stage<T, F, Fut>(
        &self,
        material_id: Uuid,
        task_type: TaskType,
        stage: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(T, serde_json::Value)>>,
    {
        self.tasks.mark_processing(material_id, task_type).await?;

        match stage().await {
            Ok((value, result)) => {
                self.tasks
                    .complete(material_id, task_type, Some(result))
                    .await?;
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    material_id = %material_id,
                    task_type = %task_type,
                    error = %message,
                    "Stage failed"
                );
                self.tasks.fail(material_id, task_type, &message).await?;
                self.materials
                    .set_status(material_id, MaterialStatus::Error, Some(&message))
                    .await?;
                Err(e)
            }
        }
    }

    async fn extract_text(
        &self,
        material_id: Uuid,
        raw_content: &str,
    ) -> Result<(String, serde_json::Value)> {
        let prompt = prompts::extraction_prompt(raw_content);
        let text = retry_operation(
            &self.retry,
            self.tasks.as_ref(),
            material_id,
            TaskType::TextExtraction,
            "Text extraction",
            || {
                self.generator
                    .generate_with_system(prompts::STUDY_ASSISTANT_SYSTEM, &prompt)
            },
        )
        .await?;

        if text.trim().is_empty() {
            return Err(Error::Inference(
                "Text extraction produced empty output".to_string(),
            ));
        }

        let result = json!({ "text_len": text.len() });
        Ok((text, result))
    }

    async fn analyze_content(
        &self,
        material_id: Uuid,
        text: &str,
    ) -> Result<(ContentAnalysis, serde_json::Value)> {
        let prompt = prompts::analysis_prompt(text);
        let raw = retry_operation(
            &self.retry,
            self.tasks.as_ref(),
            material_id,
            TaskType::ContentAnalysis,
            "Content analysis",
            || {
                self.generator
                    .generate_with_system(prompts::STUDY_ASSISTANT_SYSTEM, &prompt)
            },
        )
        .await?;

        // A malformed payload is a model contract violation, not a transient
        // fault: it fails the stage without burning the retry budget.
        let analysis = ContentAnalysis::from_response(&raw)?;
        let result = serde_json::to_value(&analysis)?;
        Ok((analysis, result))
    }

    async fn generate_embeddings(
        &self,
        material_id: Uuid,
        text: &str,
    ) -> Result<(Vec<ChunkEmbedding>, serde_json::Value)> {
        let chunks = chunk_text(text, self.batch.chunk_size);
        let total = chunks.len();
        info!(
            material_id = %material_id,
            chunk_count = total,
            chunk_size = self.batch.chunk_size,
            "Embedding chunks"
        );

        let embedder = &self.embedder;
        let tasks = &self.tasks;
        let retry = &self.retry;

        let rows = process_in_windows(
            &self.batch,
            &chunks,
            |index, chunk| async move {
                let vectors = retry_operation(
                    retry,
                    tasks.as_ref(),
                    material_id,
                    TaskType::EmbeddingGeneration,
                    "Embedding generation",
                    || embedder.embed_texts(std::slice::from_ref(&chunk)),
                )
                .await?;
                let embedding = vectors.into_iter().next().ok_or_else(|| {
                    Error::Embedding("Backend returned no vector for chunk".to_string())
                })?;
                Ok(ChunkEmbedding {
                    material_id,
                    chunk_index: index,
                    text: chunk,
                    embedding,
                })
            },
            |processed, total| async move {
                let message = format!("Processing chunk {processed} of {total}");
                tasks
                    .update_progress(
                        material_id,
                        TaskType::EmbeddingGeneration,
                        processed as f32 / total as f32,
                        Some(&message),
                    )
                    .await
            },
        )
        .await?;

        let result = json!({ "chunk_count": rows.len() });
        Ok((rows, result))
    }
}
