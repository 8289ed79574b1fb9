//! # Daily Reports
//!
//! Pure-read summary of a civil day's business. Revenue comes from bills
//! paid that day; order counts from orders served that day. Recomputable at
//! any time from the rows, nothing is persisted.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use mesa_core::Money;
use mesa_db::Database;

/// One day's totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    /// The civil day (UTC) the report covers.
    pub date: NaiveDate,

    /// Sum of totals over bills paid this day.
    pub revenue_cents: i64,

    /// Number of bills paid this day.
    pub bill_count: i64,

    /// Orders served this day.
    pub order_count: i64,

    /// Distinct tables that settled a bill this day.
    pub tables_used: i64,

    /// Average paid-bill total; zero when no bills were paid.
    pub average_bill_cents: i64,
}

impl DailyReport {
    /// Revenue as Money.
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

/// Builds the report for one UTC civil day.
pub async fn daily_report(db: &Database, date: NaiveDate) -> EngineResult<DailyReport> {
    // Midnight-to-midnight, end exclusive
    let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = start + chrono::Duration::days(1);

    let (revenue_cents, bill_count, tables_used) =
        db.bills().revenue_paid_between(start, end).await?;
    let order_count = db.orders().count_served_updated_between(start, end).await?;

    let average_bill_cents = if bill_count > 0 {
        revenue_cents / bill_count
    } else {
        0
    };

    Ok(DailyReport {
        date,
        revenue_cents,
        bill_count,
        order_count,
        tables_used,
        average_bill_cents,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
