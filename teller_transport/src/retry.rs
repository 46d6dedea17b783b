use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Linearly growing delay schedule: `initial`, `initial + step`, ... capped
/// at `max`, for at most `max_attempts` tries in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub step: Duration,
    pub max: Duration,
    pub max_attempts: usize,
}

impl Backoff {
    /// Single attempt, no waiting.
    pub const NONE: Self = Self {
        initial: Duration::ZERO,
        step: Duration::ZERO,
        max: Duration::ZERO,
        max_attempts: 1,
    };

    /// 2s, 4s, 6s, 8s, then 10s between attempts.
    #[must_use]
    pub const fn standard(max_attempts: usize) -> Self {
        Self {
            initial: Duration::from_secs(2),
            step: Duration::from_secs(2),
            max: Duration::from_secs(10),
            max_attempts,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let steps = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.step
            .checked_mul(steps)
            .and_then(|grown| self.initial.checked_add(grown))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Retry an async operation while `retryable` approves the error.
///
/// # Returns
/// The first success, or the last error once attempts run out or an error
/// is not retryable.
pub async fn retry_with_backoff<F, Fut, T, E, R>(
    mut operation: F,
    backoff: &Backoff,
    retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let attempts = backoff.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < attempts && retryable(&e) => {
                let delay = backoff.delay_after(attempt);
                warn!(
                    "Request failed (attempt {attempt}/{attempts}): {e}. Retrying after {}ms...",
                    delay.as_millis()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_attempts: usize) -> Backoff {
        Backoff {
            initial: Duration::from_millis(1),
            step: Duration::from_millis(1),
            max: Duration::from_millis(2),
            max_attempts,
        }
    }

    #[test]
    fn test_standard_schedule_grows_then_caps() {
        let backoff = Backoff::standard(8);
        let delays: Vec<u64> = (1..=6).map(|a| backoff.delay_after(a).as_secs()).collect();
        assert_eq!(delays, [2, 4, 6, 8, 10, 10]);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_first_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            &quick(3),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err(String::from("fail"))
                    } else {
                        Ok(())
                    }
                }
            },
            &quick(4),
            |_| true,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_all_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &quick(4),
            |_| true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("not found"))
                }
            },
            &quick(5),
            |e| !e.contains("not found"),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_backoff_means_one_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let _: Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &Backoff::NONE,
            |_| true,
        )
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
