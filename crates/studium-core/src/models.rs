//! Data models for studium.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// SYNCABLE CONTENT
// =============================================================================

/// A server-owned entity inside a content snapshot.
///
/// Entities are opaque to the sync layer except for their `id`, which is the
/// merge key. All remaining fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(flatten)]
    pub fields: JsonValue,
}

impl Entity {
    /// Create an entity with an empty field payload (mostly for tests).
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::json!({}),
        }
    }
}

/// One of the four entity arrays inside a [`SyncableContent`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSection {
    Topics,
    Explanations,
    Progress,
    Quizzes,
}

impl ContentSection {
    pub const ALL: [ContentSection; 4] = [
        ContentSection::Topics,
        ContentSection::Explanations,
        ContentSection::Progress,
        ContentSection::Quizzes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSection::Topics => "topics",
            ContentSection::Explanations => "explanations",
            ContentSection::Progress => "progress",
            ContentSection::Quizzes => "quizzes",
        }
    }
}

impl std::fmt::Display for ContentSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The full locally cached content snapshot: the last known merged state.
///
/// Owned exclusively by the local content store. Mutated only by the sync
/// coordinator after a successful merge, and always replaced whole, never
/// written incrementally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncableContent {
    pub topics: Vec<Entity>,
    pub explanations: Vec<Entity>,
    pub progress: Vec<Entity>,
    pub quizzes: Vec<Entity>,
    /// Epoch milliseconds of the last successful merge (local wall clock).
    pub last_sync_timestamp: i64,
}

impl SyncableContent {
    /// Borrow one of the four entity arrays by section.
    pub fn section(&self, section: ContentSection) -> &[Entity] {
        match section {
            ContentSection::Topics => &self.topics,
            ContentSection::Explanations => &self.explanations,
            ContentSection::Progress => &self.progress,
            ContentSection::Quizzes => &self.quizzes,
        }
    }

    /// Total entity count across all sections.
    pub fn entity_count(&self) -> usize {
        self.topics.len() + self.explanations.len() + self.progress.len() + self.quizzes.len()
    }
}

/// Structured result of a sync attempt, returned rather than thrown so
/// callers can degrade gracefully to cached data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    pub error: Option<String>,
    pub synced: Option<SyncableContent>,
}

impl SyncReport {
    pub fn ok(synced: SyncableContent) -> Self {
        Self {
            success: true,
            error: None,
            synced: Some(synced),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            synced: None,
        }
    }
}

// =============================================================================
// PROCESSING TASKS
// =============================================================================

/// One pipeline stage per material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Extract clean study text from the raw upload
    TextExtraction,
    /// Analyze content into a structured study breakdown
    ContentAnalysis,
    /// Generate chunk embeddings for semantic retrieval
    EmbeddingGeneration,
}

impl TaskType {
    /// Stage order of the pipeline.
    pub const ALL: [TaskType; 3] = [
        TaskType::TextExtraction,
        TaskType::ContentAnalysis,
        TaskType::EmbeddingGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TextExtraction => "text_extraction",
            TaskType::ContentAnalysis => "content_analysis",
            TaskType::EmbeddingGeneration => "embedding_generation",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text_extraction" => Ok(TaskType::TextExtraction),
            "content_analysis" => Ok(TaskType::ContentAnalysis),
            "embedding_generation" => Ok(TaskType::EmbeddingGeneration),
            other => Err(Error::InvalidInput(format!("unknown task type: {other}"))),
        }
    }
}

/// Status of a processing task. Transitions are monotonic:
/// pending → processing → {completed | error}, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    /// Terminal statuses are never left without external re-creation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

/// Durable record of one processing stage's progress for one material.
///
/// Invariant: at most one task per `(material_id, task_type)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingTask {
    pub id: Uuid,
    pub material_id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    /// Completion fraction in `[0, 1]`.
    pub progress: f32,
    /// Stage output on completion (opaque structured payload).
    pub result: Option<JsonValue>,
    /// Terminal error message, if the stage failed.
    pub error: Option<String>,
    /// Human-readable progress message ("Processing chunk 2 of 7").
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingTask {
    /// Create a fresh pending task for a material stage.
    pub fn pending(material_id: Uuid, task_type: TaskType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            material_id,
            task_type,
            status: TaskStatus::Pending,
            progress: 0.0,
            result: None,
            error: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// MATERIALS
// =============================================================================

/// Lifecycle status of an uploaded study material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    Processing,
    Ready,
    Error,
}

/// An uploaded study material and everything the pipeline derives from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: MaterialStatus,
    /// Raw uploaded content (replaced by extracted text on completion).
    pub content: String,
    pub topics: Vec<String>,
    pub processed_content: Option<ContentAnalysis>,
    /// Flat list of chunk embedding vectors, chunk order preserved.
    pub embeddings: Vec<Vec<f32>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Create a freshly uploaded material in `processing` state.
    pub fn new(user_id: Uuid, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: MaterialStatus::Processing,
            content: content.into(),
            topics: Vec::new(),
            processed_content: None,
            embeddings: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured study breakdown produced by the analysis stage.
///
/// Validated strictly at the capability boundary: a payload missing any of
/// these fields is rejected as a parse error, never silently defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub topics: Vec<String>,
    pub summary: String,
    pub key_points: Vec<String>,
    pub difficulty_level: String,
    pub prerequisites: Vec<String>,
    pub related_topics: Vec<String>,
}

impl ContentAnalysis {
    /// Parse an analysis payload from a raw model response.
    ///
    /// Tolerates a surrounding markdown code fence (models love those) but
    /// nothing else: the fenced body must be exactly the expected object.
    pub fn from_response(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw);
        serde_json::from_str(body)
            .map_err(|e| Error::parse_response("analysis", e.to_string()))
    }
}

/// Strip a single surrounding ``` or ```json fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

// =============================================================================
// CHUNKS & EMBEDDINGS
// =============================================================================

/// A chunk of text paired with its embedding. Ephemeral: produced and
/// consumed within a single processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Persisted embedding row, keyed by `(material_id, chunk_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub material_id: Uuid,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}
