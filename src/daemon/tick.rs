//! Poll tick bookkeeping
//!
//! Each tick re-evaluates every direction. Ticks fire:
//! - once at startup
//! - on a fixed interval
//! - whenever a refresh is requested

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between scheduled cycles
    pub interval: Duration,
    /// Longest a single direction's evaluation may take before it is
    /// reported as unavailable
    pub evaluation_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            evaluation_timeout: Duration::from_secs(10),
        }
    }
}

impl PollConfig {
    /// Create a new poll config
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the per-direction evaluation timeout
    pub fn with_evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.evaluation_timeout = timeout;
        self
    }
}

/// Why a cycle ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollTrigger {
    /// First cycle after the loop started
    Startup,
    /// The interval elapsed
    Interval,
    /// A refresh was requested
    Refresh,
}

/// Poll state tracks what happened across cycles
#[derive(Debug, Default)]
pub struct PollState {
    /// Number of cycles since start
    pub cycle_count: u64,
    /// Direction evaluations performed
    pub total_evaluations: u64,
    /// Evaluations that timed out, panicked, or hit a configuration fault
    pub total_unavailable: u64,
    /// When the last cycle finished
    pub last_cycle_at: Option<DateTime<Local>>,
    /// Whether shutdown has been requested
    pub shutdown_requested: bool,
}

impl PollState {
    /// Create a new poll state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished cycle
    pub fn cycle_finished(&mut self, evaluated: usize, unavailable: usize) {
        self.cycle_count += 1;
        self.total_evaluations += evaluated as u64;
        self.total_unavailable += unavailable as u64;
        self.last_cycle_at = Some(Local::now());
    }

    /// Request shutdown
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.evaluation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_poll_config_new() {
        let config = PollConfig::new(Duration::from_secs(5)).with_evaluation_timeout(Duration::from_millis(500));
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.evaluation_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_poll_state_new() {
        let state = PollState::new();
        assert_eq!(state.cycle_count, 0);
        assert!(state.last_cycle_at.is_none());
        assert!(!state.shutdown_requested);
    }

    #[test]
    fn test_poll_state_cycle_finished() {
        let mut state = PollState::new();
        state.cycle_finished(5, 1);
        state.cycle_finished(5, 0);
        assert_eq!(state.cycle_count, 2);
        assert_eq!(state.total_evaluations, 10);
        assert_eq!(state.total_unavailable, 1);
        assert!(state.last_cycle_at.is_some());
    }

    #[test]
    fn test_poll_state_shutdown() {
        let mut state = PollState::new();
        state.request_shutdown();
        assert!(state.shutdown_requested);
    }
}
