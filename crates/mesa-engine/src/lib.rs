//! # mesa-engine: Lifecycle Engine for Mesa POS
//!
//! The operational heart of Mesa POS: every table, order and bill mutation,
//! role-addressed notification dispatch, and the periodic consistency jobs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Engine                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   mesa-engine (THIS CRATE)                       │  │
//! │  │                                                                  │  │
//! │  │  ┌────────────────┐  ┌────────────────┐  ┌──────────────────┐  │  │
//! │  │  │ LifecycleEngine│  │   Scheduler    │  │ Notification     │  │  │
//! │  │  │                │  │                │  │ Dispatcher       │  │  │
//! │  │  │ seat / order / │  │ escalation     │  │                  │  │  │
//! │  │  │ bill / pay     │  │ reclamation    │  │ event → roles →  │  │  │
//! │  │  │ transitions    │  │ retention      │  │ one row each     │  │  │
//! │  │  └───────┬────────┘  └───────┬────────┘  └────────┬─────────┘  │  │
//! │  │          │                   │                    │             │  │
//! │  └──────────┼───────────────────┼────────────────────┼─────────────┘  │
//! │             ▼                   ▼                    ▼                 │
//! │  ┌──────────────────────────────────────────────────────────────────┐ │
//! │  │              mesa-db (repositories, guarded UPDATEs)             │ │
//! │  └──────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`lifecycle`] - Table/order/bill lifecycle operations
//! - [`dispatch`] / [`events`] - Notification dispatcher and its events
//! - [`scheduler`] - Periodic jobs (escalation, reclamation, retention)
//! - [`report`] - Daily business reports
//! - [`config`] - Thresholds and intervals
//! - [`error`] - Engine error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod report;
pub mod scheduler;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use dispatch::NotificationDispatcher;
pub use error::{EngineError, EngineResult};
pub use events::LifecycleEvent;
pub use lifecycle::LifecycleEngine;
pub use report::{daily_report, DailyReport};
pub use scheduler::{CheckSummary, Scheduler, SchedulerHandle};
