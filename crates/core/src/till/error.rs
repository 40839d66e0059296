//! Till ledger error types.
//!
//! Every error falls into one of four categories: bad input, a state-machine
//! conflict, a missing record, or a persistence failure.

use chrono::NaiveDate;
use parkdesk_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::MovementKind;

/// Broad class of a ledger error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or out-of-range input.
    Validation,
    /// The operation violates the day state machine.
    Conflict,
    /// The requested record does not exist.
    NotFound,
    /// The movement store failed.
    Store,
}

/// Errors that can occur during till operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Opening amount must be strictly positive.
    #[error("Opening amount must be greater than zero, got {0}")]
    NonPositiveOpening(Decimal),

    /// Movement amount cannot be negative.
    #[error("Movement amount cannot be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Amount has more than two fractional digits.
    #[error("Amount {0} has more than 2 decimal places")]
    TooManyDecimals(Decimal),

    /// Amount does not fit the till's fixed-point column.
    #[error("Amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge {
        /// Offending amount.
        amount: Decimal,
        /// Largest accepted amount.
        max: Decimal,
    },

    /// Only ingress and egress can be recorded directly.
    #[error("Movement kind {0} cannot be recorded directly")]
    NotACashFlow(MovementKind),

    /// Note exceeds the maximum length.
    #[error("Note is {len} characters long, maximum is {max}")]
    NoteTooLong {
        /// Length of the submitted note in characters.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// The movement would push the day's balance past what a closing summary can hold.
    #[error("Movement would take the till balance to {balance}, outside the limit of {max}")]
    BalanceOutOfRange {
        /// Balance the day would reach.
        balance: Decimal,
        /// Largest absolute balance accepted.
        max: Decimal,
    },

    /// Sale recorded without an invoice number.
    #[error("Invoice number is required")]
    MissingInvoiceNumber,

    /// Range start is after its end.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// First day of the range.
        start: NaiveDate,
        /// Last day of the range.
        end: NaiveDate,
    },

    // ========== State Conflicts ==========
    /// The day already has an open session.
    #[error("Till for {0} is already open")]
    DayAlreadyOpen(NaiveDate),

    /// The day was already closed and cannot be reopened.
    #[error("Till for {0} is already closed")]
    DayAlreadyClosed(NaiveDate),

    /// An earlier day is still open.
    #[error("Till for {open_date} is still open; close it before opening {requested}")]
    StaleDayOpen {
        /// The unsettled earlier day.
        open_date: NaiveDate,
        /// The day the caller tried to open.
        requested: NaiveDate,
    },

    /// No open session for the day.
    #[error("No open till session for {0}")]
    NoOpenSession(NaiveDate),

    /// A concurrent writer changed the day first.
    #[error("Concurrent modification detected, reload the till status")]
    ConcurrentModification,

    // ========== Lookup Errors ==========
    /// Movement not found.
    #[error("Movement not found: {0}")]
    MovementNotFound(i64),

    // ========== Store Errors ==========
    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NonPositiveOpening(_)
            | Self::NegativeAmount(_)
            | Self::TooManyDecimals(_)
            | Self::AmountTooLarge { .. }
            | Self::NotACashFlow(_)
            | Self::NoteTooLong { .. }
            | Self::BalanceOutOfRange { .. }
            | Self::MissingInvoiceNumber
            | Self::InvalidDateRange { .. } => ErrorCategory::Validation,

            Self::DayAlreadyOpen(_)
            | Self::DayAlreadyClosed(_)
            | Self::StaleDayOpen { .. }
            | Self::NoOpenSession(_)
            | Self::ConcurrentModification => ErrorCategory::Conflict,

            Self::MovementNotFound(_) => ErrorCategory::NotFound,

            Self::Store(_) => ErrorCategory::Store,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveOpening(_) => "NON_POSITIVE_OPENING",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::TooManyDecimals(_) => "TOO_MANY_DECIMALS",
            Self::AmountTooLarge { .. } => "AMOUNT_TOO_LARGE",
            Self::NotACashFlow(_) => "NOT_A_CASH_FLOW",
            Self::NoteTooLong { .. } => "NOTE_TOO_LONG",
            Self::BalanceOutOfRange { .. } => "BALANCE_OUT_OF_RANGE",
            Self::MissingInvoiceNumber => "MISSING_INVOICE_NUMBER",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::DayAlreadyOpen(_) => "DAY_ALREADY_OPEN",
            Self::DayAlreadyClosed(_) => "DAY_ALREADY_CLOSED",
            Self::StaleDayOpen { .. } => "STALE_DAY_OPEN",
            Self::NoOpenSession(_) => "NO_OPEN_SESSION",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::MovementNotFound(_) => "MOVEMENT_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::Conflict => 409,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Store => 500,
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Conflicts fail identically until the caller resolves them; store
    /// failures never leave partial writes behind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => Self::Validation(message),
            ErrorCategory::Conflict => Self::Conflict(message),
            ErrorCategory::NotFound => Self::NotFound(message),
            ErrorCategory::Store => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[rstest]
    #[case(LedgerError::NonPositiveOpening(Decimal::ZERO), ErrorCategory::Validation, 400)]
    #[case(LedgerError::NegativeAmount(dec!(-1)), ErrorCategory::Validation, 400)]
    #[case(LedgerError::NotACashFlow(MovementKind::Opening), ErrorCategory::Validation, 400)]
    #[case(
        LedgerError::BalanceOutOfRange { balance: dec!(10000000000.00), max: dec!(9999999999.99) },
        ErrorCategory::Validation,
        400
    )]
    #[case(LedgerError::DayAlreadyOpen(day(10)), ErrorCategory::Conflict, 409)]
    #[case(
        LedgerError::StaleDayOpen { open_date: day(9), requested: day(10) },
        ErrorCategory::Conflict,
        409
    )]
    #[case(LedgerError::NoOpenSession(day(11)), ErrorCategory::Conflict, 409)]
    #[case(LedgerError::MovementNotFound(7), ErrorCategory::NotFound, 404)]
    #[case(LedgerError::Store("timeout".into()), ErrorCategory::Store, 500)]
    fn test_category_and_status(
        #[case] err: LedgerError,
        #[case] category: ErrorCategory,
        #[case] status: u16,
    ) {
        assert_eq!(err.category(), category);
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::NonPositiveOpening(Decimal::ZERO).error_code(),
            "NON_POSITIVE_OPENING"
        );
        assert_eq!(LedgerError::DayAlreadyClosed(day(10)).error_code(), "DAY_ALREADY_CLOSED");
        assert_eq!(LedgerError::NoOpenSession(day(10)).error_code(), "NO_OPEN_SESSION");
        assert_eq!(
            LedgerError::ConcurrentModification.error_code(),
            "CONCURRENT_MODIFICATION"
        );
    }

    #[test]
    fn test_only_store_errors_are_retryable() {
        assert!(LedgerError::Store("connection reset".into()).is_retryable());
        assert!(!LedgerError::ConcurrentModification.is_retryable());
        assert!(!LedgerError::DayAlreadyOpen(day(10)).is_retryable());
        assert!(!LedgerError::NegativeAmount(dec!(-5)).is_retryable());
    }

    #[test]
    fn test_stale_day_message_names_the_open_day() {
        let err = LedgerError::StaleDayOpen {
            open_date: day(9),
            requested: day(10),
        };
        assert_eq!(
            err.to_string(),
            "Till for 2024-01-09 is still open; close it before opening 2024-01-10"
        );
    }

    #[test]
    fn test_conversion_to_app_error() {
        let app: AppError = LedgerError::NoOpenSession(day(11)).into();
        assert!(matches!(app, AppError::Conflict(_)));
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::NonPositiveOpening(Decimal::ZERO).into();
        assert!(matches!(app, AppError::Validation(_)));

        let app: AppError = LedgerError::MovementNotFound(3).into();
        assert!(matches!(app, AppError::NotFound(_)));

        let app: AppError = LedgerError::Store("pool closed".into()).into();
        assert!(app.is_internal());
    }
}
