use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Backoff before the attempt that follows failed attempt `attempt` (1-based).
///
/// The ceiling starts at `base_delay_ms`, doubles on each failure and is
/// clamped to `[min_delay_ms, max_delay_ms]`; the delay itself is drawn
/// uniformly from `[min, ceiling]`.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let min = config.min_delay_ms;
    let max = config.max_delay_ms.max(min);
    let exponent = attempt.saturating_sub(1).min(63);
    let ceiling = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .clamp(min, max);

    if ceiling <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::rng().random_range(min..=ceiling))
}

/// Run `operation` until it succeeds or `max_attempts` calls have failed.
///
/// Every error counts as transient. The last error is returned once the
/// budget is spent; no delay follows the final attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("Succeeded after {attempt} attempts");
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::error!("Giving up after {attempt} attempts: {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = backoff_delay(config, attempt);
                tracing::warn!(
                    "Attempt {attempt}/{max_attempts} failed: {e}. Retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
