//! # mesa-core: Pure Business Logic for Mesa POS
//!
//! This crate is the **heart** of Mesa POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Request layer (external collaborator)            │   │
//! │  │     create order, add item, request bill, take payment          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mesa-engine (lifecycle + scheduler)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mesa-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  billing  │  │ validation│  │   │
//! │  │   │  Table    │  │   Money   │  │ subtotal  │  │   rules   │  │   │
//! │  │   │  Order    │  │  TaxRate  │  │ BillTotals│  │  checks   │  │   │
//! │  │   │  Bill     │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mesa-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Table, Order, Bill, Notification, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`billing`] - Pure billing calculator (subtotal, tax, total)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in the smallest unit (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **One transition table**: The legal edges for Table/Order/Bill live on
//!    their status enums, nowhere else
//!
//! ## Example Usage
//!
//! ```rust
//! use mesa_core::billing::{order_subtotal, BillTotals};
//! use mesa_core::money::Money;
//! use mesa_core::types::TaxRate;
//!
//! // Samosa ×2 @ ₨80, Mango Lassi ×2 @ ₨80
//! let subtotal = order_subtotal(vec![
//!     (2, Money::from_cents(8000)),
//!     (2, Money::from_cents(8000)),
//! ]);
//!
//! let totals = BillTotals::compute(subtotal, TaxRate::default());
//! assert_eq!(totals.subtotal.cents(), 32000); // ₨320.00
//! assert_eq!(totals.tax.cents(), 1600);       // ₨16.00 at 5%
//! assert_eq!(totals.total.cents(), 33600);    // ₨336.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mesa_core::Money` instead of
// `use mesa_core::money::Money`

pub use billing::BillTotals;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate applied to newly created bills, in basis points.
///
/// 500 bps = 5%. Each bill persists its own `tax_rate_bps`, which is the
/// single source of truth for that bill's amounts; this constant only seeds
/// new rows.
pub const DEFAULT_TAX_RATE_BPS: u32 = 500;

/// Maximum quantity of a single menu item on one order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of display names (menu items, staff).
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of free-text notes (order notes, line notes).
pub const MAX_NOTE_LENGTH: usize = 500;
