//! # Billing Calculator
//!
//! Pure functions deriving bill amounts from an order's line items.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Billing Pipeline                                  │
//! │                                                                         │
//! │  order items ──► line_total(qty, unit_price) per row                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  order_subtotal = Σ line totals                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  BillTotals::compute(subtotal, rate)                                     │
//! │    tax   = round(subtotal × rate)        (half-up, integer math)        │
//! │    total = subtotal + tax                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no caching: every call recomputes from the current rows. That
//! is why the Bill entity snapshots its amounts at generation time: a
//! paid bill must not re-derive totals from a possibly-mutated order.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::TaxRate;

/// Total price of one order line: quantity × unit price.
#[inline]
pub fn line_total(quantity: i64, unit_price: Money) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Subtotal over an order's current lines, given as (quantity, unit price)
/// pairs. Unit prices are whatever the menu says right now (live-read).
pub fn order_subtotal<I>(lines: I) -> Money
where
    I: IntoIterator<Item = (i64, Money)>,
{
    lines
        .into_iter()
        .fold(Money::zero(), |acc, (qty, price)| acc + line_total(qty, price))
}

/// The three derived amounts written onto a bill at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl BillTotals {
    /// Computes tax and total from a subtotal at the given rate.
    ///
    /// Invariants, for every output:
    /// - `total == subtotal + tax`
    /// - `tax == subtotal.calculate_tax(rate)` (half-up integer rounding)
    pub fn compute(subtotal: Money, rate: TaxRate) -> Self {
        let tax = subtotal.calculate_tax(rate);
        BillTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
