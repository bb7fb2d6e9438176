//! Core traits for studium abstractions.
//!
//! These traits define the seams between the sync/pipeline core and its
//! external collaborators (durable storage, network, AI capability),
//! enabling pluggable backends and testability with fakes.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DURABLE KEY-VALUE STORAGE
// =============================================================================

/// Durable key-value storage used for snapshot, task, and progress
/// persistence. Writes are expected to be atomic per key.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a value by key, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value, replacing any previous value atomically.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key (no-op if absent).
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key.
    async fn get_all_keys(&self) -> Result<Vec<String>>;

    /// Remove several keys in one call.
    async fn multi_remove(&self, keys: &[String]) -> Result<()>;
}

// =============================================================================
// NETWORK COLLABORATORS
// =============================================================================

/// Network reachability oracle.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Remote delta source: returns server content changed since a timestamp.
#[async_trait]
pub trait RemoteContentSource: Send + Sync {
    /// Fetch the content delta since `since_ms` (epoch milliseconds).
    async fn fetch_since(&self, since_ms: i64) -> Result<SyncableContent>;
}

// =============================================================================
// TASK / MATERIAL / EMBEDDING REPOSITORIES
// =============================================================================

/// Repository for durable per-stage processing task records.
///
/// Implementations must keep at most one task per `(material_id, task_type)`
/// pair and must reject status regressions out of terminal states.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert or replace the task for `(task.material_id, task.task_type)`.
    async fn upsert(&self, task: &ProcessingTask) -> Result<()>;

    /// Get the task for a material stage, `None` if absent.
    async fn get(&self, material_id: Uuid, task_type: TaskType) -> Result<Option<ProcessingTask>>;

    /// List all tasks for a material, ordered by creation time.
    async fn list_for_material(&self, material_id: Uuid) -> Result<Vec<ProcessingTask>>;

    /// Transition a task to `processing`.
    async fn mark_processing(&self, material_id: Uuid, task_type: TaskType) -> Result<()>;

    /// Update progress (and optional message) on a non-terminal task.
    async fn update_progress(
        &self,
        material_id: Uuid,
        task_type: TaskType,
        progress: f32,
        message: Option<&str>,
    ) -> Result<()>;

    /// Mark a task completed with its stage output.
    async fn complete(
        &self,
        material_id: Uuid,
        task_type: TaskType,
        result: Option<JsonValue>,
    ) -> Result<()>;

    /// Mark a task failed with a terminal error message.
    async fn fail(&self, material_id: Uuid, task_type: TaskType, error: &str) -> Result<()>;
}

/// Repository for material records.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Insert a new material record.
    async fn insert(&self, material: &Material) -> Result<()>;

    /// Get a material by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Material>>;

    /// Update only the status (and error message) of a material.
    async fn set_status(
        &self,
        id: Uuid,
        status: MaterialStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Terminal pipeline write: extracted content, topics, structured
    /// analysis, and embeddings in one update, status set to `ready`.
    async fn finalize(
        &self,
        id: Uuid,
        content: &str,
        topics: &[String],
        processed: &ContentAnalysis,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()>;
}

/// Repository for persisted chunk embeddings.
#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Store chunk embeddings for a material, replacing any existing rows.
    async fn store_chunks(&self, material_id: Uuid, chunks: &[ChunkEmbedding]) -> Result<()>;

    /// Get all chunk embeddings for a material, ordered by chunk index.
    async fn get_for_material(&self, material_id: Uuid) -> Result<Vec<ChunkEmbedding>>;
}

// =============================================================================
// INFERENCE CAPABILITY
// =============================================================================

/// Backend for text generation (the pluggable "content processor").
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
