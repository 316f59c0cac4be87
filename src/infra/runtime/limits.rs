use std::time::Duration;

use crate::core::error::AgentError;

/// Build a reqwest client with a short connect timeout and the given request timeout.
pub fn make_http_client_with(timeout: Duration) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5).min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::InvalidConfig(format!("http client: {e}")))
}

/// Exponential backoff: `base * 2^n`, capped at `max_delay`, for at most `retries` extra attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub retries: u32,
    pub base: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    pub fn new(retries: u32, base: Duration) -> Self {
        Self { retries, base, max_delay: Duration::from_secs(60) }
    }

    pub fn delay_for(&self, try_num: u32) -> Duration {
        let factor = 1u32.checked_shl(try_num).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_delay)
    }
}

/// Retry an async op while `should_retry` accepts the error and attempts remain.
pub async fn retry_async<T, E, Fut, F, P>(policy: Backoff, mut op: F, should_retry: P) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempts = policy.retries;
    let mut try_num: u32 = 0;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !should_retry(&e) {
                    return Err(e);
                }
                attempts -= 1;
                let delay = policy.delay_for(try_num);
                tracing::debug!(attempt = try_num + 1, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                tokio::time::sleep(delay).await;
                try_num += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(retries: u32) -> Backoff {
        Backoff::new(retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn it_retries_then_succeeds() {
        let mut calls = 0;
        let res: Result<i32, i32> = retry_async(
            fast(3),
            move |_| {
                calls += 1;
                let c = calls;
                async move {
                    if c < 3 {
                        Err(-1)
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(res.unwrap(), 42);
    }

    #[tokio::test]
    async fn it_stops_when_error_is_not_retryable() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let res: Result<(), String> = retry_async(
            fast(5),
            |_| {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async { Err("fatal".to_string()) }
            },
            |e| e != "fatal",
        )
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn it_gives_up_after_configured_retries() {
        let calls = std::sync::atomic::AtomicU32::new(0);
        let res: Result<(), String> = retry_async(
            fast(3),
            |_| {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async { Err("flaky".to_string()) }
            },
            |_| true,
        )
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 4);
    }

    #[test]
    fn delay_doubles_from_base_and_caps() {
        let b = Backoff::new(3, Duration::from_secs(2));
        assert_eq!(b.delay_for(0), Duration::from_secs(2));
        assert_eq!(b.delay_for(1), Duration::from_secs(4));
        assert_eq!(b.delay_for(2), Duration::from_secs(8));
        assert_eq!(b.delay_for(10), Duration::from_secs(60));
        assert_eq!(b.delay_for(40), Duration::from_secs(60));
    }
}
