//! Reconnection policy for sessions that dropped abnormally

use std::time::Duration;

use crate::config::{DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS};

/// Bounds for automatic reconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    /// Fixed delay before every attempt
    pub delay: Duration,
}

impl ReconnectPolicy {
    /// Enabled policy with the given bounds
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            enabled: true,
            max_attempts,
            delay,
        }
    }

    /// Policy that never reconnects
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

/// Attempt counter for one session
///
/// Attempts are only counted when a disconnect notification arrives, never
/// on a timer. The counter is reset when a call reaches Active.
#[derive(Debug)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Check if we should reconnect and get the delay
    ///
    /// Returns `Some(delay)` and counts the attempt if allowed, `None` once
    /// the policy is disabled or exhausted.
    pub fn should_reconnect(&mut self) -> Option<Duration> {
        if !self.policy.enabled || self.attempts >= self.policy.max_attempts {
            return None;
        }

        self.attempts += 1;
        Some(self.policy.delay)
    }

    /// Reset after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }
}
