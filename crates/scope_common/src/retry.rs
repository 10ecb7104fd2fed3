use std::fmt::Display;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Retry and timeout policy for the two boundaries that can stall: the
/// classifier call and the video seek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds
    pub backoff_ms: u64,
    /// Upper bound for a single attempt in milliseconds
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff_ms: 50,
            timeout_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no pause
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Run `op` until it succeeds or the attempts are used up. The closure
    /// receives the 1-based attempt number. The last error is returned.
    pub fn run<T, E, F>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if attempt < attempts => {
                    warn!(operation = label, attempt, %error, "attempt failed, retrying");
                    if self.backoff_ms > 0 {
                        std::thread::sleep(Duration::from_millis(self.backoff_ms));
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_after_transient_failure() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 0,
            timeout_ms: 100,
        };
        let mut calls = 0;
        let result: Result<u32, String> = policy.run("flaky", |attempt| {
            calls += 1;
            if attempt < 2 { Err("not yet".to_string()) } else { Ok(attempt) }
        });
        assert_eq!(result, Ok(2));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_returns_last_error_when_exhausted() {
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff_ms: 0,
            timeout_ms: 100,
        };
        let result: Result<(), String> = policy.run("broken", |attempt| Err(format!("fail {}", attempt)));
        assert_eq!(result, Err("fail 2".to_string()));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::none()
        };
        let mut calls = 0;
        let _: Result<(), &str> = policy.run("once", |_| {
            calls += 1;
            Err("no")
        });
        assert_eq!(calls, 1);
    }
}
