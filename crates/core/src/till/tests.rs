//! Scenario tests for the till ledger over the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::error::{ErrorCategory, LedgerError};
use super::memory::MemoryMovementStore;
use super::service::{CLOSING_NOTE, LedgerService, OPENING_NOTE};
use super::types::{DateSelection, MovementKind};
use super::validation::MAX_AMOUNT;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn ledger() -> LedgerService<MemoryMovementStore> {
    LedgerService::new(Arc::new(MemoryMovementStore::new()))
}

// ========== Scenarios ==========

#[tokio::test]
async fn scenario_a_open_record_close() {
    let ledger = ledger();

    ledger.open(day(10), dec!(100.00), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Ingress, dec!(50.00), Some("sale".into()), None)
        .await
        .unwrap();
    ledger
        .record(day(10), MovementKind::Egress, dec!(20.00), Some("refund".into()), None)
        .await
        .unwrap();
    let report = ledger.close(day(10), None).await.unwrap();

    assert_eq!(report.final_balance, dec!(130.00));
    assert_eq!(report.closing_movement.kind, MovementKind::ClosingSummary);
    assert_eq!(report.closing_movement.amount, dec!(130.00));
    assert_eq!(report.closing_movement.note.as_deref(), Some(CLOSING_NOTE));
    assert_eq!(report.movements.len(), 4);
    assert!(report.movements[0].is_settled_opening());
}

#[tokio::test]
async fn scenario_b_zero_opening_is_rejected() {
    let ledger = ledger();

    let err = ledger.open(day(10), Decimal::ZERO, None).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(!ledger.status(day(10)).await.unwrap().is_open);
}

#[tokio::test]
async fn scenario_c_record_without_open() {
    let ledger = ledger();

    let err = ledger
        .record(day(11), MovementKind::Ingress, dec!(10.00), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::NoOpenSession(d) if d == day(11)));
    assert_eq!(err.category(), ErrorCategory::Conflict);
}

#[tokio::test]
async fn scenario_d_double_open_keeps_first_session() {
    let ledger = ledger();
    let first = ledger.open(day(10), dec!(100.00), None).await.unwrap();

    let err = ledger.open(day(10), dec!(50.00), None).await.unwrap_err();
    assert!(matches!(err, LedgerError::DayAlreadyOpen(_)));

    let status = ledger.status(day(10)).await.unwrap();
    assert!(status.is_open);
    assert_eq!(status.balance, dec!(100.00));
    assert_eq!(status.opening, Some(first));
    assert_eq!(status.movements.len(), 1);
}

#[tokio::test]
async fn scenario_e_stale_earlier_day_blocks_open() {
    let ledger = ledger();
    ledger.open(day(9), dec!(100.00), None).await.unwrap();

    let err = ledger.open(day(10), dec!(100.00), None).await.unwrap_err();

    assert!(matches!(
        err,
        LedgerError::StaleDayOpen { open_date, requested }
            if open_date == day(9) && requested == day(10)
    ));
    assert!(err.to_string().contains("2024-01-09"));

    // Closing the stale day unblocks the next one.
    ledger.close(day(9), None).await.unwrap();
    ledger.open(day(10), dec!(100.00), None).await.unwrap();
}

// ========== Properties ==========

#[tokio::test]
async fn p1_concurrent_opens_yield_exactly_one_success() {
    let ledger = ledger();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.open(day(10), Decimal::new(100 + i, 0), None).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) if e.category() == ErrorCategory::Conflict => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);

    let trail = ledger.query(DateSelection::Day(day(10))).await.unwrap();
    assert_eq!(trail.movements.len(), 1);
}

#[tokio::test]
async fn p2_no_record_after_close() {
    let ledger = ledger();
    ledger.open(day(10), dec!(100.00), None).await.unwrap();
    ledger.close(day(10), None).await.unwrap();

    for kind in [MovementKind::Ingress, MovementKind::Egress] {
        let err = ledger
            .record(day(10), kind, dec!(1.00), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoOpenSession(_)));
    }

    assert!(matches!(
        ledger.close(day(10), None).await,
        Err(LedgerError::NoOpenSession(_))
    ));
    assert!(matches!(
        ledger.open(day(10), dec!(10.00), None).await,
        Err(LedgerError::DayAlreadyClosed(_))
    ));
}

#[tokio::test]
async fn p4_status_reads_are_idempotent() {
    let ledger = ledger();
    ledger.open(day(10), dec!(80.00), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Ingress, dec!(12.34), None, None)
        .await
        .unwrap();

    let first = ledger.status(day(10)).await.unwrap();
    let second = ledger.status(day(10)).await.unwrap();
    assert_eq!(first, second);

    ledger.close(day(10), None).await.unwrap();
    let first = ledger.status(day(10)).await.unwrap();
    let second = ledger.status(day(10)).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn p5_carry_over_guard_spans_several_days() {
    let ledger = ledger();
    ledger.open(day(1), dec!(50.00), None).await.unwrap();

    for d in [2, 5, 31] {
        assert!(matches!(
            ledger.open(day(d), dec!(50.00), None).await,
            Err(LedgerError::StaleDayOpen { open_date, .. }) if open_date == day(1)
        ));
    }
}

// ========== Edge cases ==========

#[tokio::test]
async fn zero_amount_movement_is_recorded() {
    let ledger = ledger();
    ledger.open(day(10), dec!(100.00), None).await.unwrap();

    let movement = ledger
        .record(day(10), MovementKind::Egress, Decimal::ZERO, None, None)
        .await
        .unwrap();

    assert_eq!(movement.amount, Decimal::ZERO);
    let status = ledger.status(day(10)).await.unwrap();
    assert_eq!(status.movements.len(), 2);
    assert_eq!(status.balance, dec!(100.00));
}

#[tokio::test]
async fn record_rejects_non_cash_flow_kinds_before_touching_the_store() {
    let ledger = ledger();

    for kind in [MovementKind::Opening, MovementKind::ClosingSummary] {
        let err = ledger
            .record(day(10), kind, dec!(1.00), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotACashFlow(k) if k == kind));
    }
}

#[tokio::test]
async fn failed_validation_leaves_status_untouched() {
    let ledger = ledger();
    ledger.open(day(10), dec!(100.00), None).await.unwrap();
    let before = ledger.status(day(10)).await.unwrap();

    let long_note = "x".repeat(201);
    assert!(
        ledger
            .record(day(10), MovementKind::Ingress, dec!(5), Some(long_note), None)
            .await
            .is_err()
    );
    assert!(
        ledger
            .record(day(10), MovementKind::Ingress, dec!(-5), None, None)
            .await
            .is_err()
    );

    assert_eq!(ledger.status(day(10)).await.unwrap(), before);
}

#[tokio::test]
async fn status_of_empty_day_is_zeroed() {
    let status = ledger().status(day(15)).await.unwrap();

    assert_eq!(status.date, day(15));
    assert!(!status.is_open);
    assert_eq!(status.balance, Decimal::ZERO);
    assert!(status.opening.is_none());
    assert!(status.movements.is_empty());
}

#[tokio::test]
async fn status_of_closed_day_uses_summary_and_hides_settled_rows() {
    let ledger = ledger();
    ledger.open(day(10), dec!(100.00), None).await.unwrap();
    let sale = ledger
        .record(day(10), MovementKind::Ingress, dec!(25.00), None, None)
        .await
        .unwrap();
    ledger.close(day(10), None).await.unwrap();

    let status = ledger.status(day(10)).await.unwrap();

    assert!(!status.is_open);
    assert_eq!(status.balance, dec!(125.00));
    assert!(status.opening.is_none());
    assert_eq!(status.movements, vec![sale]);
}

#[tokio::test]
async fn open_status_lists_opening_in_insertion_order() {
    let ledger = ledger();
    let opening = ledger.open(day(10), dec!(100.00), None).await.unwrap();
    let egress = ledger
        .record(day(10), MovementKind::Egress, dec!(30.00), None, None)
        .await
        .unwrap();
    let ingress = ledger
        .record(day(10), MovementKind::Ingress, dec!(5.50), None, None)
        .await
        .unwrap();

    let status = ledger.status(day(10)).await.unwrap();

    assert_eq!(opening.note.as_deref(), Some(OPENING_NOTE));
    assert_eq!(status.movements, vec![opening, egress, ingress]);
    assert_eq!(status.balance, dec!(75.50));
}

#[tokio::test]
async fn closing_balance_may_be_negative() {
    let ledger = ledger();
    ledger.open(day(10), dec!(10.00), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Egress, dec!(40.00), None, None)
        .await
        .unwrap();

    let report = ledger.close(day(10), None).await.unwrap();

    assert_eq!(report.final_balance, dec!(-30.00));
    assert_eq!(ledger.status(day(10)).await.unwrap().balance, dec!(-30.00));
}

#[tokio::test]
async fn day_at_the_balance_limit_still_closes() {
    let ledger = ledger();
    ledger.open(day(10), dec!(9999999998.99), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Ingress, dec!(1.00), None, None)
        .await
        .unwrap();

    let report = ledger.close(day(10), None).await.unwrap();

    assert_eq!(report.final_balance, MAX_AMOUNT);
    ledger.open(day(11), dec!(100.00), None).await.unwrap();
}

#[tokio::test]
async fn ingress_past_the_balance_limit_is_rejected_and_day_stays_closable() {
    let ledger = ledger();
    ledger.open(day(10), MAX_AMOUNT, None).await.unwrap();

    let err = ledger
        .record(day(10), MovementKind::Ingress, MAX_AMOUNT, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BalanceOutOfRange { .. }));
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(ledger.status(day(10)).await.unwrap().movements.len(), 1);

    let report = ledger.close(day(10), None).await.unwrap();
    assert_eq!(report.final_balance, MAX_AMOUNT);
    ledger.open(day(11), dec!(100.00), None).await.unwrap();
}

#[tokio::test]
async fn egress_past_the_negative_limit_is_rejected() {
    let ledger = ledger();
    ledger.open(day(10), dec!(0.01), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Egress, MAX_AMOUNT, None, None)
        .await
        .unwrap();

    let err = ledger
        .record(day(10), MovementKind::Egress, dec!(1.00), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BalanceOutOfRange { .. }));

    let report = ledger.close(day(10), None).await.unwrap();
    assert_eq!(report.final_balance, dec!(-9999999999.98));
}

#[tokio::test]
async fn query_returns_full_trail_without_double_counting() {
    let ledger = ledger();
    ledger.open(day(9), dec!(100.00), None).await.unwrap();
    ledger
        .record(day(9), MovementKind::Ingress, dec!(20.00), None, None)
        .await
        .unwrap();
    ledger.close(day(9), None).await.unwrap();
    ledger.open(day(10), dec!(50.00), None).await.unwrap();
    ledger
        .record(day(10), MovementKind::Egress, dec!(5.00), None, None)
        .await
        .unwrap();

    let single = ledger.query(DateSelection::Day(day(9))).await.unwrap();
    assert_eq!(single.movements.len(), 3);
    assert_eq!(single.balance, dec!(120.00));

    let range = ledger
        .query(DateSelection::Range {
            start: day(9),
            end: day(10),
        })
        .await
        .unwrap();
    let kinds: Vec<MovementKind> = range.movements.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::Opening,
            MovementKind::Ingress,
            MovementKind::ClosingSummary,
            MovementKind::Opening,
            MovementKind::Egress,
        ]
    );
    assert_eq!(range.balance, dec!(165.00));
}

#[tokio::test]
async fn query_rejects_reversed_range() {
    let err = ledger()
        .query(DateSelection::Range {
            start: day(10),
            end: day(9),
        })
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn sale_is_recorded_as_invoice_ingress() {
    let ledger = ledger();
    let cashier = Uuid::new_v4();
    ledger.open(day(10), dec!(100.00), Some(cashier)).await.unwrap();

    let sale = ledger
        .record_sale(day(10), " 000123 ", dec!(45.90), Some(cashier))
        .await
        .unwrap();

    assert_eq!(sale.kind, MovementKind::Ingress);
    assert_eq!(sale.note.as_deref(), Some("Invoice #000123"));
    assert_eq!(sale.created_by, Some(cashier));

    assert!(matches!(
        ledger.record_sale(day(10), "  ", dec!(1.00), None).await,
        Err(LedgerError::MissingInvoiceNumber)
    ));
}

#[tokio::test]
async fn current_status_reports_day_left_open() {
    let ledger = ledger();
    ledger.open(day(9), dec!(100.00), None).await.unwrap();

    let status = ledger.current_status(day(10)).await.unwrap();
    assert_eq!(status.date, day(9));
    assert!(status.is_open);

    ledger.close(day(9), None).await.unwrap();
    let status = ledger.current_status(day(10)).await.unwrap();
    assert_eq!(status.date, day(10));
    assert!(!status.is_open);
}

#[tokio::test]
async fn movement_lookup() {
    let ledger = ledger();
    let opening = ledger.open(day(10), dec!(100.00), None).await.unwrap();

    assert_eq!(ledger.movement(opening.id).await.unwrap(), opening);
    assert!(matches!(
        ledger.movement(404).await,
        Err(LedgerError::MovementNotFound(404))
    ));
}
