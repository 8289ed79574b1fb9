//! # Repository Layer
//!
//! Database access organized by aggregate. Each repository wraps the shared
//! `SqlitePool` and exposes typed operations; state transitions go through
//! guarded conditional UPDATEs so concurrent writers (live requests, the
//! scheduler) cannot corrupt a row.

pub mod bill;
pub mod menu;
pub mod notification;
pub mod order;
pub mod staff;
pub mod table;

pub use bill::BillRepository;
pub use menu::MenuRepository;
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use staff::StaffRepository;
pub use table::TableRepository;
