//! # Validation Module
//!
//! Input validation utilities for Mesa POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client layer (out of scope here)                             │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Called by the lifecycle engine before any mutation                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK / foreign key constraints               │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LENGTH, MAX_NOTE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a table's business number.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_table_number(number: i64) -> ValidationResult<()> {
    if number < 1 {
        return Err(ValidationError::MustBePositive {
            field: "table_number".to_string(),
        });
    }
    Ok(())
}

/// Validates a table's seating capacity.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_seating_capacity(capacity: i64) -> ValidationResult<()> {
    if capacity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "seating_capacity".to_string(),
        });
    }
    Ok(())
}

/// Validates a menu item price.
///
/// ## Rules
/// - Must be strictly positive (free dishes are not a thing)
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents".to_string(),
        });
    }
    Ok(())
}

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be between 1 and [`MAX_ITEM_QUANTITY`]
///
/// ## Example
/// ```rust
/// use mesa_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(10_000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (menu item, staff member).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`MAX_NAME_LENGTH`] characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates an optional free-text note.
///
/// ## Rules
/// - At most [`MAX_NOTE_LENGTH`] characters when present
pub fn validate_note(note: Option<&str>) -> ValidationResult<()> {
    if let Some(note) = note {
        if note.len() > MAX_NOTE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "note".to_string(),
                max: MAX_NOTE_LENGTH,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
