//! Structured logging field name constants for studium.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback or retry applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (chunks, entities) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "sync", "pipeline", "store", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "sync_content", "process_material", "embed_texts"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Material UUID being processed.
pub const MATERIAL_ID: &str = "material_id";

/// Processing task stage (task type enum variant).
pub const TASK_TYPE: &str = "task_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks produced or processed.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Concurrency window ordinal within a batch run.
pub const WINDOW: &str = "window";

/// Number of entities touched by a merge or sync.
pub const ENTITY_COUNT: &str = "entity_count";

/// Retry attempt ordinal (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
