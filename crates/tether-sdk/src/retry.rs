// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-task retry policies.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::collections::ConcurrentMap;

/// How often and how patiently to retry a failing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 = run once, never retry)
    pub max_retries: u32,
    /// Retries performed so far
    pub total_retries: u32,
    /// Base wait between attempts
    pub retry_time: Duration,
    /// Double the wait after every retry
    pub backoff: bool,
    pub name: String,
}

impl RetryPolicy {
    pub fn new(name: impl Into<String>, max_retries: u32, retry_time: Duration) -> Self {
        Self {
            max_retries,
            total_retries: 0,
            retry_time,
            backoff: false,
            name: name.into(),
        }
    }

    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn retries_remaining(&self) -> u32 {
        self.max_retries.saturating_sub(self.total_retries)
    }

    /// Wait before the given retry (1-indexed).
    ///
    /// With backoff: `retry_time * 2^(attempt-1)`, otherwise `retry_time`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.backoff {
            return self.retry_time;
        }
        let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_time.saturating_mul(multiplier)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new("default", 0, Duration::from_secs(1))
    }
}

/// Registry of retry policies keyed by task id.
#[derive(Debug, Default)]
pub struct RetryEngine {
    policies: ConcurrentMap<String, RetryPolicy>,
}

impl RetryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the policy for a task.
    pub fn add_policy(&self, id: impl Into<String>, policy: RetryPolicy) {
        self.policies.insert(id.into(), policy);
    }

    /// Current policy for a task, if any.
    pub fn check_policy(&self, id: &str) -> Option<RetryPolicy> {
        self.policies.get(&id.to_string())
    }

    pub fn clear_policy(&self, id: &str) -> Option<RetryPolicy> {
        self.policies.remove(&id.to_string())
    }

    /// Count one failure against a task's policy.
    ///
    /// Returns `true` if a retry is still allowed (and counts it), `false`
    /// if the task has no policy or has used up its retries.
    pub fn record_failure(&self, id: &str) -> bool {
        self.policies
            .update(&id.to_string(), |policy| {
                if policy.total_retries < policy.max_retries {
                    policy.total_retries += 1;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false)
    }

    /// Run `op` under `policy`.
    ///
    /// The operation is invoked at most `max_retries + 1` times; the last
    /// error is returned once retries run out. `policy.total_retries` is
    /// advanced for every retry performed.
    pub async fn run_policy<T, E, F, Fut>(&self, policy: &mut RetryPolicy, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= policy.max_retries => {
                    warn!(
                        policy = %policy.name,
                        attempts = attempt + 1,
                        error = %e,
                        "Retries exhausted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    policy.total_retries += 1;
                    let delay = policy.delay_for_attempt(attempt);
                    debug!(
                        policy = %policy.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ========== RetryPolicy Tests ==========

    #[test]
    fn test_delay_without_backoff_is_constant() {
        let policy = RetryPolicy::new("p", 3, Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(100));
    }

    #[test]
    fn test_delay_with_backoff_doubles() {
        let policy = RetryPolicy::new("p", 3, Duration::from_millis(100)).with_backoff(true);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new("p", 100, Duration::from_secs(1)).with_backoff(true);
        assert_eq!(
            policy.delay_for_attempt(64),
            Duration::from_secs(u64::from(u32::MAX))
        );
    }

    // ========== RetryEngine Tests ==========

    #[test]
    fn test_policy_registry() {
        let engine = RetryEngine::new();
        assert!(engine.check_policy("t1").is_none());

        engine.add_policy("t1", RetryPolicy::new("t1", 2, Duration::ZERO));
        assert_eq!(engine.check_policy("t1").unwrap().max_retries, 2);

        assert!(engine.clear_policy("t1").is_some());
        assert!(engine.check_policy("t1").is_none());
    }

    #[test]
    fn test_record_failure_counts_down() {
        let engine = RetryEngine::new();
        engine.add_policy("t1", RetryPolicy::new("t1", 2, Duration::ZERO));

        assert!(engine.record_failure("t1"));
        assert!(engine.record_failure("t1"));
        assert!(!engine.record_failure("t1"));
        assert_eq!(engine.check_policy("t1").unwrap().total_retries, 2);
        assert!(!engine.record_failure("unknown"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_policy_gives_up_after_max_retries() {
        let engine = RetryEngine::new();
        let mut policy = RetryPolicy::new("flaky", 3, Duration::from_millis(50)).with_backoff(true);
        let calls = AtomicU32::new(0);

        let start = tokio::time::Instant::now();
        let result: Result<(), String> = engine
            .run_policy(&mut policy, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(format!("failure {}", n)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 4");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(policy.total_retries, 3);
        // 50 + 100 + 200
        assert_eq!(start.elapsed(), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_policy_stops_on_success() {
        let engine = RetryEngine::new();
        let mut policy = RetryPolicy::new("eventually", 5, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: Result<u32, String> = engine
            .run_policy(&mut policy, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if n < 3 { Err("not yet".to_string()) } else { Ok(n) } }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(policy.total_retries, 2);
    }

    #[tokio::test]
    async fn test_run_policy_without_retries_runs_once() {
        let engine = RetryEngine::new();
        let mut policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = engine
            .run_policy(&mut policy, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("nope") }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
