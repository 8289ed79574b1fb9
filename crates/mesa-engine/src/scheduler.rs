//! # Scheduler
//!
//! Periodic consistency jobs: pending-bill escalation, abandoned-table
//! reclamation and notification retention.
//!
//! ## Loop Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scheduler Loop                                     │
//! │                                                                         │
//! │  tokio::spawn(scheduler.run())                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  interval tick (5 min, MissedTickBehavior::Delay)                      │
//! │       │                                                                 │
//! │       ├── escalate_pending_bills(now)     ┐                            │
//! │       ├── reclaim_abandoned_tables(now)   ├── each under a 30 s        │
//! │       ├── prune_notifications(now)        ┘   timeout budget           │
//! │       │                                                                 │
//! │       ├── day rolled over? → log yesterday's report                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SchedulerHandle::shutdown() → loop exits                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Jobs are per-entity fault isolated: one failing row is logged and
//! counted, the rest of the batch proceeds. All claims go through guarded
//! UPDATEs, so running several scheduler instances (or restarting
//! mid-batch) never double-notifies.

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::dispatch::NotificationDispatcher;
use crate::error::EngineResult;
use crate::events::LifecycleEvent;
use crate::report;
use mesa_core::{Money, TableStatus};
use mesa_db::Database;

// =============================================================================
// Check Summary
// =============================================================================

/// Outcome of one scheduled sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Bills escalated to managers this sweep.
    pub escalated: usize,

    /// Abandoned tables closed this sweep.
    pub reclaimed: usize,

    /// Old read notifications deleted this sweep.
    pub pruned: u64,

    /// Per-entity failures and job timeouts, logged but not fatal.
    pub failures: usize,
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for stopping a running scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Triggers graceful shutdown. The loop exits after the current sweep.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Runs the periodic consistency jobs.
pub struct Scheduler {
    db: Database,
    dispatcher: NotificationDispatcher,
    config: EngineConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Scheduler {
    /// Creates a scheduler and its shutdown handle.
    pub fn new(db: Database, config: EngineConfig) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let dispatcher = NotificationDispatcher::new(db.clone());

        let scheduler = Scheduler {
            db,
            dispatcher,
            config,
            shutdown_rx,
        };
        let handle = SchedulerHandle { shutdown_tx };

        (scheduler, handle)
    }

    /// Runs the scheduler loop until shutdown.
    pub async fn run(mut self) {
        info!(
            tick_secs = self.config.tick_interval.as_secs(),
            "Scheduler starting"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut current_day: NaiveDate = Utc::now().date_naive();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    let summary = self.run_scheduled_checks(now).await;
                    debug!(
                        escalated = summary.escalated,
                        reclaimed = summary.reclaimed,
                        pruned = summary.pruned,
                        failures = summary.failures,
                        "Sweep complete"
                    );

                    // First tick after midnight logs yesterday's numbers
                    let today = now.date_naive();
                    if today > current_day {
                        self.log_daily_report(current_day).await;
                        current_day = today;
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Runs all three mutating jobs, each under the configured budget.
    ///
    /// Never returns an error: a failing or overrunning job is counted in
    /// `failures` and retried on the next sweep.
    pub async fn run_scheduled_checks(&self, now: DateTime<Utc>) -> CheckSummary {
        let mut summary = CheckSummary::default();
        let budget = self.config.job_budget;

        match tokio::time::timeout(budget, self.escalate_pending_bills(now)).await {
            Ok((escalated, failures)) => {
                summary.escalated = escalated;
                summary.failures += failures;
            }
            Err(_) => {
                warn!(budget_secs = budget.as_secs(), "Escalation sweep overran its budget");
                summary.failures += 1;
            }
        }

        match tokio::time::timeout(budget, self.reclaim_abandoned_tables(now)).await {
            Ok((reclaimed, failures)) => {
                summary.reclaimed = reclaimed;
                summary.failures += failures;
            }
            Err(_) => {
                warn!(budget_secs = budget.as_secs(), "Reclamation sweep overran its budget");
                summary.failures += 1;
            }
        }

        match tokio::time::timeout(budget, self.prune_notifications(now)).await {
            Ok(Ok(pruned)) => summary.pruned = pruned,
            Ok(Err(e)) => {
                error!(error = %e, "Notification pruning failed");
                summary.failures += 1;
            }
            Err(_) => {
                warn!(budget_secs = budget.as_secs(), "Pruning overran its budget");
                summary.failures += 1;
            }
        }

        summary
    }

    /// Escalates bills that have been pending past the threshold.
    ///
    /// Each candidate is claimed atomically via the persisted
    /// `last_escalated_at` marker before any notification is written; a
    /// bill escalated within the last full window is skipped. Returns
    /// `(escalated, failures)`.
    pub async fn escalate_pending_bills(&self, now: DateTime<Utc>) -> (usize, usize) {
        let cutoff = now - self.config.pending_bill_after;
        let repeat_cutoff = now - self.config.pending_bill_after;

        let candidates = match self.db.bills().pending_older_than(cutoff).await {
            Ok(bills) => bills,
            Err(e) => {
                error!(error = %e, "Failed to list pending bills");
                return (0, 1);
            }
        };

        let mut escalated = 0;
        let mut failures = 0;

        for bill in candidates {
            let claimed = match self
                .db
                .bills()
                .claim_escalation(&bill.id, now, repeat_cutoff)
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    error!(error = %e, bill_id = %bill.id, "Escalation claim failed");
                    failures += 1;
                    continue;
                }
            };

            if !claimed {
                // Escalated within the window, or another instance won
                continue;
            }

            let table = match self.db.tables().get_by_id(&bill.table_id).await {
                Ok(Some(table)) => table,
                Ok(None) => {
                    warn!(bill_id = %bill.id, "Pending bill references a missing table");
                    failures += 1;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, bill_id = %bill.id, "Failed to load bill's table");
                    failures += 1;
                    continue;
                }
            };

            let hours_pending = (now - bill.updated_at).num_hours();
            info!(
                bill_id = %bill.id,
                table_number = table.table_number,
                hours_pending,
                "Escalating pending bill"
            );

            self.dispatcher
                .dispatch(&LifecycleEvent::BillPending {
                    bill_id: bill.id.clone(),
                    table_id: table.id.clone(),
                    table_number: table.table_number,
                    total: Money::from_cents(bill.total_cents),
                    hours_pending,
                })
                .await;

            escalated += 1;
        }

        (escalated, failures)
    }

    /// Closes occupied tables that look abandoned.
    ///
    /// A table is abandoned when its most recent activity is older than the
    /// threshold: the latest order's creation time, or the occupancy
    /// timestamp itself for a table that never got an order. The
    /// occupied→closed transition is guarded; a table that moved meanwhile
    /// (bill requested, freed) is skipped silently. Returns
    /// `(reclaimed, failures)`.
    pub async fn reclaim_abandoned_tables(&self, now: DateTime<Utc>) -> (usize, usize) {
        let cutoff = now - self.config.abandoned_after;

        let occupied = match self.db.tables().list_by_status(TableStatus::Occupied).await {
            Ok(tables) => tables,
            Err(e) => {
                error!(error = %e, "Failed to list occupied tables");
                return (0, 1);
            }
        };

        let mut reclaimed = 0;
        let mut failures = 0;

        for table in occupied {
            let abandoned = match self.db.orders().latest_for_table(&table.id).await {
                Ok(Some(order)) => order.created_at <= cutoff,
                // Never ordered: last activity is whenever it was occupied
                Ok(None) => table.updated_at <= cutoff,
                Err(e) => {
                    error!(error = %e, table_number = table.table_number, "Failed to load latest order");
                    failures += 1;
                    continue;
                }
            };

            if !abandoned {
                continue;
            }

            match self
                .db
                .tables()
                .transition(&table.id, TableStatus::Occupied, TableStatus::Closed, now)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_stale() => {
                    // Another instance reclaimed it, or service resumed
                    debug!(table_number = table.table_number, "Table moved on, skipping");
                    continue;
                }
                Err(e) => {
                    error!(error = %e, table_number = table.table_number, "Reclamation failed");
                    failures += 1;
                    continue;
                }
            }

            info!(table_number = table.table_number, "Reclaimed abandoned table");

            self.dispatcher
                .dispatch(&LifecycleEvent::TableAutoClosed {
                    table_id: table.id.clone(),
                    table_number: table.table_number,
                })
                .await;

            reclaimed += 1;
        }

        (reclaimed, failures)
    }

    /// Deletes read notifications past the retention period.
    pub async fn prune_notifications(&self, now: DateTime<Utc>) -> EngineResult<u64> {
        let cutoff = now - self.config.retention;
        let pruned = self.db.notifications().prune_read_older_than(cutoff).await?;

        if pruned > 0 {
            info!(pruned, "Pruned old notifications");
        }

        Ok(pruned)
    }

    async fn log_daily_report(&self, day: NaiveDate) {
        match report::daily_report(&self.db, day).await {
            Ok(report) => info!(
                date = %report.date,
                revenue = %report.revenue(),
                bills = report.bill_count,
                orders = report.order_count,
                tables_used = report.tables_used,
                "Daily report"
            ),
            Err(e) => error!(error = %e, date = %day, "Failed to build daily report"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
