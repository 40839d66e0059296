//! Input validation for till operations.
//!
//! All checks run before a store session is opened.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::MovementKind;

/// Maximum note length in characters.
pub const MAX_NOTE_LEN: usize = 200;

/// Fractional digits kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount accepted on a single movement (fits `NUMERIC(12, 2)`).
///
/// 9,999,999,999.99: mantissa 999_999_999_999 split into 32-bit words.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, AMOUNT_SCALE);

/// Validates the cash placed in the register on open.
///
/// # Errors
///
/// Returns a validation error if the amount is not strictly positive or is malformed.
pub fn validate_opening_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveOpening(amount));
    }
    validate_precision(amount)
}

/// Validates an ingress or egress amount. Zero is accepted.
///
/// # Errors
///
/// Returns a validation error if the amount is negative or is malformed.
pub fn validate_movement_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::NegativeAmount(amount));
    }
    validate_precision(amount)
}

/// Ensures only ingress and egress are recorded directly.
///
/// # Errors
///
/// Returns `LedgerError::NotACashFlow` for openings and closing summaries.
pub fn validate_cash_flow(kind: MovementKind) -> Result<(), LedgerError> {
    if kind.is_cash_flow() {
        Ok(())
    } else {
        Err(LedgerError::NotACashFlow(kind))
    }
}

/// Validates an optional note.
///
/// # Errors
///
/// Returns `LedgerError::NoteTooLong` if the note exceeds [`MAX_NOTE_LEN`] characters.
pub fn validate_note(note: Option<&str>) -> Result<(), LedgerError> {
    if let Some(note) = note {
        let len = note.chars().count();
        if len > MAX_NOTE_LEN {
            return Err(LedgerError::NoteTooLong {
                len,
                max: MAX_NOTE_LEN,
            });
        }
    }
    Ok(())
}

/// Ensures a day's balance stays storable as a closing summary.
///
/// # Errors
///
/// Returns `LedgerError::BalanceOutOfRange` when `balance` lies outside
/// `-MAX_AMOUNT..=MAX_AMOUNT`.
pub fn validate_running_balance(balance: Decimal) -> Result<(), LedgerError> {
    if balance.abs() > MAX_AMOUNT {
        return Err(LedgerError::BalanceOutOfRange {
            balance,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

fn validate_precision(amount: Decimal) -> Result<(), LedgerError> {
    // 10.50 and 10.5 are the same amount; only significant digits count.
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::TooManyDecimals(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::AmountTooLarge {
            amount,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(100))]
    #[case(dec!(100.00))]
    #[case(dec!(100.500))]
    #[case(dec!(9999999999.99))]
    fn test_valid_opening_amounts(#[case] amount: Decimal) {
        assert!(validate_opening_amount(amount).is_ok());
    }

    #[test]
    fn test_opening_must_be_positive() {
        assert!(matches!(
            validate_opening_amount(Decimal::ZERO),
            Err(LedgerError::NonPositiveOpening(_))
        ));
        assert!(matches!(
            validate_opening_amount(dec!(-10)),
            Err(LedgerError::NonPositiveOpening(_))
        ));
    }

    #[rstest]
    #[case(dec!(9999999999.99), true)]
    #[case(dec!(-9999999999.99), true)]
    #[case(Decimal::ZERO, true)]
    #[case(dec!(10000000000.00), false)]
    #[case(dec!(-10000000000.00), false)]
    fn test_running_balance_bound(#[case] balance: Decimal, #[case] ok: bool) {
        assert_eq!(validate_running_balance(balance).is_ok(), ok);
    }

    #[test]
    fn test_zero_movement_is_accepted() {
        assert!(validate_movement_amount(Decimal::ZERO).is_ok());
        assert!(validate_movement_amount(dec!(0.00)).is_ok());
    }

    #[test]
    fn test_negative_movement_is_rejected() {
        assert!(matches!(
            validate_movement_amount(dec!(-0.01)),
            Err(LedgerError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_more_than_two_decimals_rejected() {
        assert!(matches!(
            validate_movement_amount(dec!(10.005)),
            Err(LedgerError::TooManyDecimals(_))
        ));
        assert!(matches!(
            validate_opening_amount(dec!(0.001)),
            Err(LedgerError::TooManyDecimals(_))
        ));
    }

    #[test]
    fn test_amount_above_column_limit_rejected() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999.99));
        assert!(matches!(
            validate_movement_amount(dec!(10000000000.00)),
            Err(LedgerError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_cash_flow_kinds() {
        assert!(validate_cash_flow(MovementKind::Ingress).is_ok());
        assert!(validate_cash_flow(MovementKind::Egress).is_ok());
        assert!(validate_cash_flow(MovementKind::Opening).is_err());
        assert!(validate_cash_flow(MovementKind::ClosingSummary).is_err());
    }

    #[test]
    fn test_note_length_counts_characters() {
        let at_limit = "ñ".repeat(MAX_NOTE_LEN);
        assert!(validate_note(Some(&at_limit)).is_ok());

        let too_long = "a".repeat(MAX_NOTE_LEN + 1);
        assert!(matches!(
            validate_note(Some(&too_long)),
            Err(LedgerError::NoteTooLong { len: 201, max: 200 })
        ));

        assert!(validate_note(None).is_ok());
    }
}
