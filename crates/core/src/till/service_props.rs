//! Property-based tests for LedgerService.
//!
//! - Closing balance equals opening + ingress - egress, in any order
//! - Status never changes between reads

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::memory::MemoryMovementStore;
use super::service::LedgerService;
use super::types::MovementKind;

/// Strategy to generate non-negative amounts (0.00 to 100,000.00).
fn cents() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|c| Decimal::new(c, 2))
}

/// Strategy to generate a cash-flow movement.
fn cash_flow() -> impl Strategy<Value = (MovementKind, Decimal)> {
    (
        prop_oneof![Just(MovementKind::Ingress), Just(MovementKind::Egress)],
        cents(),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

proptest! {
    /// Closing balance is decimal-exact and independent of interleaving.
    #[test]
    fn prop_close_balance_matches_formula(
        opening in (1i64..10_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        flows in prop::collection::vec(cash_flow(), 0..40),
    ) {
        let expected = flows.iter().fold(opening, |acc, (kind, amount)| match kind {
            MovementKind::Ingress => acc + amount,
            _ => acc - amount,
        });

        let mut reversed = flows.clone();
        reversed.reverse();

        for sequence in [flows, reversed] {
            let final_balance = runtime().block_on(async {
                let ledger = LedgerService::new(Arc::new(MemoryMovementStore::new()));
                ledger.open(date(), opening, None).await.unwrap();
                for (kind, amount) in sequence {
                    ledger.record(date(), kind, amount, None, None).await.unwrap();
                }
                ledger.close(date(), None).await.unwrap().final_balance
            });
            prop_assert_eq!(final_balance, expected);
        }
    }

    /// Repeated status reads agree.
    #[test]
    fn prop_status_is_idempotent(
        opening in (1i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        flows in prop::collection::vec(cash_flow(), 0..10),
        close in any::<bool>(),
    ) {
        let (first, second) = runtime().block_on(async {
            let ledger = LedgerService::new(Arc::new(MemoryMovementStore::new()));
            ledger.open(date(), opening, None).await.unwrap();
            for (kind, amount) in flows {
                ledger.record(date(), kind, amount, None, None).await.unwrap();
            }
            if close {
                ledger.close(date(), None).await.unwrap();
            }
            (
                ledger.status(date()).await.unwrap(),
                ledger.status(date()).await.unwrap(),
            )
        });
        prop_assert_eq!(first, second);
    }
}
