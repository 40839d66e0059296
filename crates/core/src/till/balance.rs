//! Till balance calculations.
//!
//! Openings and ingresses add, egresses subtract, closing summaries are
//! ignored. Accumulation is exact decimal; rounding happens only on output.

use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{Movement, MovementKind};
use super::validation::AMOUNT_SCALE;

/// Running totals over a set of movements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TillBalance {
    /// Sum of opening and ingress amounts.
    pub inflow: Decimal,
    /// Sum of egress amounts.
    pub outflow: Decimal,
}

impl TillBalance {
    /// Creates an empty balance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inflow: Decimal::ZERO,
            outflow: Decimal::ZERO,
        }
    }

    /// Adds a movement to the totals.
    pub fn add(&mut self, movement: &Movement) {
        match movement.kind {
            MovementKind::Opening | MovementKind::Ingress => self.inflow += movement.amount,
            MovementKind::Egress => self.outflow += movement.amount,
            MovementKind::ClosingSummary => {}
        }
    }

    /// Net balance, rounded to the till's two fractional digits.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        (self.inflow - self.outflow).round_dp(AMOUNT_SCALE)
    }
}

impl<'a> FromIterator<&'a Movement> for TillBalance {
    fn from_iter<I: IntoIterator<Item = &'a Movement>>(iter: I) -> Self {
        let mut totals = Self::new();
        for movement in iter {
            totals.add(movement);
        }
        totals
    }
}

/// Signed sum over `movements`.
#[must_use]
pub fn signed_sum<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Decimal {
    movements.into_iter().collect::<TillBalance>().balance()
}
