//! # mesa-db: Database Layer for Mesa POS
//!
//! This crate provides database access for the Mesa POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Data Flow                               │
//! │                                                                         │
//! │  Lifecycle Engine / Scheduler (mesa-engine)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mesa-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (table.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │   order.rs,   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│   bill.rs...) │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │               │    │              │  │   │
//! │  │   │ Management    │    │ Guarded       │    │              │  │   │
//! │  │   └───────────────┘    │ transitions   │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │              /var/lib/mesa/mesa.db (WAL mode)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (table, menu, order, bill,
//!   notification, staff)
//!
//! ## Concurrency Model
//!
//! Live requests and the scheduler share the pool. Every status transition
//! is a conditional UPDATE guarded on the expected current status and
//! checked via `rows_affected`; a lost race surfaces as
//! [`DbError::StaleState`], never as a silent overwrite. The pay-bill
//! operation mutates the bill and its table in a single transaction.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesa_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/mesa.db")).await?;
//!
//! let table = db.tables().insert(4, 6, Utc::now()).await?;
//! let order = db.orders().insert(&table.id, None, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::bill::BillRepository;
pub use repository::menu::MenuRepository;
pub use repository::notification::{NewNotification, NotificationRepository};
pub use repository::order::OrderRepository;
pub use repository::staff::StaffRepository;
pub use repository::table::TableRepository;
