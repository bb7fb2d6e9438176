//! Retry with linear backoff and durable attempt tracking.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use studium_core::defaults::{RETRY_BASE_DELAY_MS, TASK_MAX_RETRIES};
use studium_core::{Error, Result, TaskRepository, TaskType};

/// Retry policy for transient pipeline failures.
///
/// Backoff is linear: attempt `n` waits `base_delay_ms * n` before the next
/// try. No delay follows the final attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: TASK_MAX_RETRIES,
            base_delay_ms: RETRY_BASE_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Create policy from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STUDIUM_TASK_MAX_RETRIES` | `3` | Attempts per operation |
    /// | `STUDIUM_RETRY_BASE_DELAY_MS` | `1000` | Base backoff delay |
    pub fn from_env() -> Self {
        let max_retries = std::env::var("STUDIUM_TASK_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(TASK_MAX_RETRIES)
            .max(1);

        let base_delay_ms = std::env::var("STUDIUM_RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(RETRY_BASE_DELAY_MS);

        Self {
            max_retries,
            base_delay_ms,
        }
    }

    /// Set the attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the base backoff delay.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }
}

/// Run `op` up to `policy.max_retries` times.
///
/// Every failed attempt is persisted against the stage task: progress is set
/// to `(attempt - 1) / max_retries` and the message records the error, so an
/// observer polling the task sees the retry in flight. The last error is
/// returned once the budget is exhausted.
pub async fn retry_operation<T, F, Fut>(
    policy: &RetryPolicy,
    tasks: &dyn TaskRepository,
    material_id: Uuid,
    task_type: TaskType,
    description: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = policy.max_retries.max(1);
    let mut last_error: Option<Error> = None;

    for attempt in 1..=max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    material_id = %material_id,
                    task_type = %task_type,
                    attempt,
                    max_retries,
                    error = %e,
                    "{description} attempt failed"
                );

                let progress = (attempt - 1) as f32 / max_retries as f32;
                let message =
                    format!("{description} failed (attempt {attempt} of {max_retries}): {e}");
                tasks
                    .update_progress(material_id, task_type, progress, Some(&message))
                    .await?;

                if attempt < max_retries {
                    sleep(Duration::from_millis(
                        policy.base_delay_ms * u64::from(attempt),
                    ))
                    .await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| Error::Internal("retry loop finished without attempts".to_string())))
}
