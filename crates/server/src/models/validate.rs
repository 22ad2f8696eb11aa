//! Structured input validation.
//!
//! Validation runs as explicit functions on request payloads, before any
//! store access. Failures accumulate into a [`ValidationErrors`] list so a
//! client sees every broken field at once.

use core::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

/// A single failed field check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Accumulated validation failures for one request payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(ValidationError {
            field,
            message: message.into(),
        });
    }

    /// True when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The individual failures.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Convert into `Ok(())` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check that a text field is present after trimming.
///
/// Returns the trimmed value so callers persist normalized text.
pub fn require_trimmed(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "is required");
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Largest accepted price, matching the `NUMERIC(12, 2)` storage column.
/// Bounding input here keeps cart totals far from `Decimal`'s range.
#[must_use]
pub fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Check that a price is present, non-negative and within storage range.
pub fn require_price(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<Decimal>,
) -> Option<Decimal> {
    match value {
        None => {
            errors.push(field, "is required");
            None
        }
        Some(p) if p < Decimal::ZERO => {
            errors.push(field, "must not be negative");
            None
        }
        Some(p) if p > max_price() => {
            errors.push(field, format!("must not exceed {}", max_price()));
            None
        }
        Some(p) => Some(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_accumulator_converts_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn display_joins_all_failures() {
        let mut errors = ValidationErrors::new();
        errors.push("title", "is required");
        errors.push("price", "must not be negative");
        assert_eq!(
            errors.to_string(),
            "title: is required; price: must not be negative"
        );
    }

    #[test]
    fn require_trimmed_normalizes_and_flags() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            require_trimmed(&mut errors, "title", "  Dune  ").as_deref(),
            Some("Dune")
        );
        assert!(errors.is_empty());

        assert!(require_trimmed(&mut errors, "author", "   ").is_none());
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn require_price_bounds_both_ends() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            require_price(&mut errors, "price", Some(max_price())),
            Some(max_price())
        );
        assert_eq!(
            require_price(&mut errors, "price", Some(Decimal::ZERO)),
            Some(Decimal::ZERO)
        );
        assert!(errors.is_empty());

        assert!(require_price(&mut errors, "price", None).is_none());
        assert!(require_price(&mut errors, "price", Some(Decimal::new(-1, 0))).is_none());
        assert!(require_price(&mut errors, "price", Some(Decimal::MAX)).is_none());
        assert_eq!(errors.errors().len(), 3);
    }
}
