//! Backoff for idempotent reads
//!
//! Only reads go through a policy. The validate/import procedures and every
//! write are sent exactly once: the backend offers no idempotency key, so a
//! blind retry could import the same batch twice.

use log::{debug, info, warn};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total sends, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Spread waits over 50%..150% of the computed delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Why an attempt did not produce a usable response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, DNS, reset before a response arrived
    Transport,
    Timeout,
    /// 429, possibly with a server-provided wait
    Throttled,
    /// 5xx from the REST gateway or the auth service
    Server(u16),
    /// Expired or missing token, row-level security denial
    Unauthorized,
    /// Any other 4xx: the request itself is wrong
    Rejected(u16),
    Other,
}

impl FailureKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => FailureKind::Unauthorized,
            408 => FailureKind::Timeout,
            429 => FailureKind::Throttled,
            code @ 400..=499 => FailureKind::Rejected(code),
            code @ 500..=599 => FailureKind::Server(code),
            _ => FailureKind::Other,
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FailureKind::Timeout
        } else if error.is_connect() || error.is_request() {
            FailureKind::Transport
        } else if let Some(status) = error.status() {
            Self::from_status(status)
        } else {
            FailureKind::Other
        }
    }

    /// Worth sending the same read again
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::Transport | FailureKind::Timeout | FailureKind::Throttled | FailureKind::Server(_)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Send a read, repeating it after transient failures
    ///
    /// Any response that is not worth repeating comes back as-is so the
    /// caller can read the backend's error body; the same goes for the last
    /// response once attempts run out. A 429 with `Retry-After` waits as
    /// long as the server asks, up to `max_delay`.
    pub async fn execute<F, Fut>(&self, send: F) -> anyhow::Result<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Sending read (attempt {}/{})", attempt, max_attempts);
            let last_attempt = attempt >= max_attempts;

            let wait = match send().await {
                Ok(response) if response.status().is_success() => {
                    if attempt > 1 {
                        info!("Read succeeded on attempt {}", attempt);
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    let kind = FailureKind::from_status(response.status());
                    if !kind.is_transient() || last_attempt {
                        debug!("Giving up with status {} ({:?})", response.status(), kind);
                        return Ok(response);
                    }
                    warn!("Read got {} on attempt {}, retrying", response.status(), attempt);
                    retry_after(&response)
                        .map(|wait| wait.min(self.config.max_delay))
                        .unwrap_or_else(|| self.backoff(attempt))
                }
                Err(error) => {
                    let kind = FailureKind::from_transport(&error);
                    if !kind.is_transient() || last_attempt {
                        warn!("Read failed on attempt {} ({:?}): {}", attempt, kind, error);
                        return Err(error.into());
                    }
                    warn!("Read failed on attempt {}, retrying: {}", attempt, error);
                    self.backoff(attempt)
                }
            };

            debug!("Waiting {:?} before the next attempt", wait);
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    /// Wait after the given (1-based) failed attempt
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.config.base_delay.as_millis() as f64 * self.config.backoff_multiplier.powi(exponent);
        let capped = Duration::from_millis(millis as u64).min(self.config.max_delay);

        if self.config.jitter {
            capped.mul_f64(rand::thread_rng().gen_range(0.5..=1.5))
        } else {
            capped
        }
    }
}

/// `Retry-After` given in whole seconds
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let seconds = response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(seconds))
}
