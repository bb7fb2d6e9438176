//! Windowed concurrent processing for chunked work.

use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::sleep;
use tracing::debug;

use studium_core::defaults::{CHUNK_SIZE, MAX_CONCURRENT_CHUNKS, RATE_LIMIT_DELAY_MS};
use studium_core::Result;

/// Configuration for chunked batch processing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Chunks processed concurrently per window.
    pub max_concurrent: usize,
    /// Pause between windows in milliseconds.
    pub rate_limit_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_concurrent: MAX_CONCURRENT_CHUNKS,
            rate_limit_delay_ms: RATE_LIMIT_DELAY_MS,
        }
    }
}

impl BatchConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STUDIUM_CHUNK_SIZE` | `4000` | Max characters per chunk |
    /// | `STUDIUM_MAX_CONCURRENT_CHUNKS` | `3` | Window width |
    /// | `STUDIUM_RATE_LIMIT_DELAY_MS` | `1000` | Pause between windows |
    pub fn from_env() -> Self {
        let chunk_size = std::env::var("STUDIUM_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(CHUNK_SIZE)
            .max(1);

        let max_concurrent = std::env::var("STUDIUM_MAX_CONCURRENT_CHUNKS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_CONCURRENT_CHUNKS)
            .max(1);

        let rate_limit_delay_ms = std::env::var("STUDIUM_RATE_LIMIT_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(RATE_LIMIT_DELAY_MS);

        Self {
            chunk_size,
            max_concurrent,
            rate_limit_delay_ms,
        }
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the window width.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Set the pause between windows.
    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }
}

/// Process `items` in windows of `config.max_concurrent`.
///
/// Items within a window run concurrently; windows run back to back with a
/// rate-limit pause between them and none after the last. Output order
/// matches input order. The first failing item aborts the whole batch.
///
/// `report` is awaited once per completed window with `(processed, total)`.
pub async fn process_in_windows<T, F, Fut, P, PFut>(
    config: &BatchConfig,
    items: &[String],
    op: F,
    mut report: P,
) -> Result<Vec<T>>
where
    F: Fn(usize, String) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(usize, usize) -> PFut,
    PFut: Future<Output = Result<()>>,
{
    let total = items.len();
    let width = config.max_concurrent.max(1);
    let mut results = Vec::with_capacity(total);

    for (window, chunk) in items.chunks(width).enumerate() {
        let base = window * width;
        let futures = chunk
            .iter()
            .enumerate()
            .map(|(offset, item)| op(base + offset, item.clone()));

        let window_results = try_join_all(futures).await?;
        results.extend(window_results);

        debug!(
            window,
            processed = results.len(),
            total,
            "Window complete"
        );
        report(results.len(), total).await?;

        if results.len() < total && config.rate_limit_delay_ms > 0 {
            sleep(Duration::from_millis(config.rate_limit_delay_ms)).await;
        }
    }

    Ok(results)
}
