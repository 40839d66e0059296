//! Domain types for the till ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::error::LedgerError;

/// Kind of a till movement.
///
/// The kind carries the sign of the movement; amounts themselves are stored
/// unsigned (except for closing summaries, which hold the day's balance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Initial cash placed in the register when the day opens.
    Opening,
    /// Cash coming in (sales, deposits).
    Ingress,
    /// Cash going out (refunds, petty expenses).
    Egress,
    /// Balance snapshot written when the day closes.
    ClosingSummary,
}

impl MovementKind {
    /// Returns the wire/storage name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Ingress => "ingress",
            Self::Egress => "egress",
            Self::ClosingSummary => "closing_summary",
        }
    }

    /// Returns true for kinds a caller may record on an open day.
    #[must_use]
    pub const fn is_cash_flow(self) -> bool {
        matches!(self, Self::Ingress | Self::Egress)
    }

    /// Contribution of `amount` to a running balance.
    ///
    /// Closing summaries contribute nothing so a closed day is never counted twice.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Opening | Self::Ingress => amount,
            Self::Egress => -amount,
            Self::ClosingSummary => Decimal::ZERO,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown movement kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown movement kind: {0}")]
pub struct UnknownMovementKind(pub String);

impl FromStr for MovementKind {
    type Err = UnknownMovementKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opening" => Ok(Self::Opening),
            "ingress" => Ok(Self::Ingress),
            "egress" => Ok(Self::Egress),
            "closing_summary" => Ok(Self::ClosingSummary),
            other => Err(UnknownMovementKind(other.to_string())),
        }
    }
}

/// A persisted till movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Store-assigned identifier, ascending in insertion order.
    pub id: i64,
    /// Business day the movement belongs to.
    pub date: NaiveDate,
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount with at most two fractional digits.
    pub amount: Decimal,
    /// Free-text note.
    pub note: Option<String>,
    /// Set on the day's opening once the day is closed.
    pub settled_at: Option<DateTime<Utc>>,
    /// User who caused the movement, as handed in by the caller.
    pub created_by: Option<Uuid>,
    /// Audit timestamp. Never used for ordering.
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Contribution of this movement to a balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Returns true for an opening that has been settled by a close.
    #[must_use]
    pub const fn is_settled_opening(&self) -> bool {
        matches!(self.kind, MovementKind::Opening) && self.settled_at.is_some()
    }
}

/// A movement about to be appended to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    /// Business day.
    pub date: NaiveDate,
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount.
    pub amount: Decimal,
    /// Free-text note.
    pub note: Option<String>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Session state of a single business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    /// No opening recorded for the day.
    NoSession,
    /// Opening recorded, not yet closed.
    Open,
    /// Closing summary recorded. Terminal for the day.
    Closed,
}

impl DayState {
    /// Derives the state from all movements of one day.
    #[must_use]
    pub fn of(movements: &[Movement]) -> Self {
        let has = |kind| movements.iter().any(|m| m.kind == kind);
        if has(MovementKind::ClosingSummary) {
            Self::Closed
        } else if has(MovementKind::Opening) {
            Self::Open
        } else {
            Self::NoSession
        }
    }
}

/// Snapshot of a day's till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TillStatus {
    /// Business day the snapshot describes.
    pub date: NaiveDate,
    /// Whether records may still be added.
    pub is_open: bool,
    /// Live balance when open, closing balance when closed.
    pub balance: Decimal,
    /// The unsettled opening, present only while the day is open.
    pub opening: Option<Movement>,
    /// Active movements in insertion order.
    pub movements: Vec<Movement>,
}

impl TillStatus {
    /// Status of a day that never opened.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            is_open: false,
            balance: Decimal::ZERO,
            opening: None,
            movements: Vec::new(),
        }
    }
}

/// Result of closing a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosingReport {
    /// The appended closing summary.
    pub closing_movement: Movement,
    /// Balance the day closed with.
    pub final_balance: Decimal,
    /// Every movement of the day after the close, summary included.
    pub movements: Vec<Movement>,
}

/// Result of a date or range query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementQuery {
    /// Movements ordered by date, then id.
    pub movements: Vec<Movement>,
    /// Signed sum over the returned movements.
    pub balance: Decimal,
}

/// Dates a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    /// A single business day.
    Day(NaiveDate),
    /// An inclusive range of business days.
    Range {
        /// First day.
        start: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },
}

impl DateSelection {
    /// Returns the inclusive bounds of the selection.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidDateRange` when `start` is after `end`.
    pub fn bounds(self) -> Result<(NaiveDate, NaiveDate), LedgerError> {
        match self {
            Self::Day(date) => Ok((date, date)),
            Self::Range { start, end } if start > end => {
                Err(LedgerError::InvalidDateRange { start, end })
            }
            Self::Range { start, end } => Ok((start, end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn movement(id: i64, kind: MovementKind, amount: Decimal) -> Movement {
        Movement {
            id,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            kind,
            amount,
            note: None,
            settled_at: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            MovementKind::Opening,
            MovementKind::Ingress,
            MovementKind::Egress,
            MovementKind::ClosingSummary,
        ] {
            assert_eq!(kind.as_str().parse::<MovementKind>().unwrap(), kind);
        }
        assert!("refund".parse::<MovementKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MovementKind::ClosingSummary).unwrap();
        assert_eq!(json, "\"closing_summary\"");
    }

    #[test]
    fn test_signed_contribution() {
        assert_eq!(MovementKind::Opening.signed(dec!(100.00)), dec!(100.00));
        assert_eq!(MovementKind::Ingress.signed(dec!(50.00)), dec!(50.00));
        assert_eq!(MovementKind::Egress.signed(dec!(20.00)), dec!(-20.00));
        assert_eq!(MovementKind::ClosingSummary.signed(dec!(130.00)), Decimal::ZERO);
    }

    #[test]
    fn test_only_ingress_and_egress_are_cash_flow() {
        assert!(MovementKind::Ingress.is_cash_flow());
        assert!(MovementKind::Egress.is_cash_flow());
        assert!(!MovementKind::Opening.is_cash_flow());
        assert!(!MovementKind::ClosingSummary.is_cash_flow());
    }

    #[test]
    fn test_day_state() {
        assert_eq!(DayState::of(&[]), DayState::NoSession);

        let open = vec![
            movement(1, MovementKind::Opening, dec!(100)),
            movement(2, MovementKind::Ingress, dec!(5)),
        ];
        assert_eq!(DayState::of(&open), DayState::Open);

        let mut closed = open;
        closed.push(movement(3, MovementKind::ClosingSummary, dec!(105)));
        assert_eq!(DayState::of(&closed), DayState::Closed);
    }

    #[test]
    fn test_date_selection_bounds() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        assert_eq!(DateSelection::Day(d1).bounds().unwrap(), (d1, d1));
        assert_eq!(
            DateSelection::Range { start: d1, end: d2 }.bounds().unwrap(),
            (d1, d2)
        );
        assert!(matches!(
            DateSelection::Range { start: d2, end: d1 }.bounds(),
            Err(LedgerError::InvalidDateRange { .. })
        ));
    }
}
