//! Centralized default constants for studium.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// SYNC
// =============================================================================

/// Interval between periodic background syncs (15 minutes).
pub const SYNC_INTERVAL_SECS: u64 = 15 * 60;

/// Broadcast channel capacity for sync events.
pub const SYNC_EVENT_CAPACITY: usize = 64;

// =============================================================================
// CHUNKING & BATCHING
// =============================================================================

/// Maximum characters per chunk for embedding generation.
pub const CHUNK_SIZE: usize = 4000;

/// Maximum chunks processed concurrently within one window.
pub const MAX_CONCURRENT_CHUNKS: usize = 3;

/// Fixed delay between concurrency windows (external API rate limiting).
pub const RATE_LIMIT_DELAY_MS: u64 = 1000;

// =============================================================================
// RETRY
// =============================================================================

/// Maximum attempts for a retried external-capability call.
pub const TASK_MAX_RETRIES: u32 = 3;

/// Base delay for linear retry backoff (attempt N sleeps N × base).
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model name (Ollama).
pub const GEN_MODEL: &str = "llama3.1:8b";

/// Default embedding model name (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Key holding the full offline content snapshot.
pub const CONTENT_SNAPSHOT_KEY: &str = "studium:content";

/// Key prefix for processing task records.
pub const TASK_KEY_PREFIX: &str = "studium:task:";

/// Key prefix for material records.
pub const MATERIAL_KEY_PREFIX: &str = "studium:material:";

/// Key prefix for persisted chunk embeddings.
pub const EMBEDDING_KEY_PREFIX: &str = "studium:embeddings:";
