//! # Engine Configuration
//!
//! Thresholds and intervals for the lifecycle engine and scheduler.
//!
//! ## Defaults
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scheduler Timing                                   │
//! │                                                                         │
//! │  tick_interval        5 min    how often run_scheduled_checks fires    │
//! │  pending_bill_after   2 h      bill pending this long → escalate       │
//! │  abandoned_after      4 h      occupied, latest order this old → close │
//! │  retention            30 d     read notifications older → pruned        │
//! │  job_budget           30 s     per-job timeout, skip rather than block │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The escalation repeat window equals `pending_bill_after`: a bill that
//! stays pending is re-escalated once per full window, not once per tick.

use chrono::Duration;

/// Configuration for the lifecycle engine and scheduler.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a bill may sit `pending` before managers are notified.
    pub pending_bill_after: Duration,

    /// How old a table's latest activity must be before the table is
    /// considered abandoned. Activity is the latest order's creation time,
    /// or the occupancy timestamp for a table that never got an order.
    pub abandoned_after: Duration,

    /// Read notifications older than this are deleted.
    pub retention: Duration,

    /// How often the scheduler runs its checks.
    pub tick_interval: std::time::Duration,

    /// Per-job time budget. A job that overruns is abandoned this tick and
    /// retried on the next one.
    pub job_budget: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            pending_bill_after: Duration::hours(2),
            abandoned_after: Duration::hours(4),
            retention: Duration::days(30),
            tick_interval: std::time::Duration::from_secs(5 * 60),
            job_budget: std::time::Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Sets the pending-bill escalation threshold.
    pub fn pending_bill_after(mut self, after: Duration) -> Self {
        self.pending_bill_after = after;
        self
    }

    /// Sets the abandoned-table threshold.
    pub fn abandoned_after(mut self, after: Duration) -> Self {
        self.abandoned_after = after;
        self
    }

    /// Sets the notification retention period.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the scheduler tick interval.
    pub fn tick_interval(mut self, interval: std::time::Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets the per-job time budget.
    pub fn job_budget(mut self, budget: std::time::Duration) -> Self {
        self.job_budget = budget;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pending_bill_after, Duration::hours(2));
        assert_eq!(config.abandoned_after, Duration::hours(4));
        assert_eq!(config.retention, Duration::days(30));
        assert_eq!(config.tick_interval.as_secs(), 300);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default()
            .pending_bill_after(Duration::minutes(30))
            .retention(Duration::days(7));
        assert_eq!(config.pending_bill_after, Duration::minutes(30));
        assert_eq!(config.retention, Duration::days(7));
        // Untouched fields keep defaults
        assert_eq!(config.abandoned_after, Duration::hours(4));
    }
}
