//! Till routes: open, record, close, status and movement queries.
//!
//! Amounts are accepted as JSON numbers or strings and always returned as
//! strings with two decimals. Dates are `YYYY-MM-DD`; a missing date means
//! the current business day.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, extractors::ValidatedJson, middleware::AuthUser};
use parkdesk_core::till::{
    ClosingReport, DateSelection, ErrorCategory, LedgerError, Movement, MovementKind,
    MovementQuery, MovementStore, TillStatus,
};
use parkdesk_shared::AppError;

/// Creates the till routes (requires auth middleware to be applied externally).
pub fn routes<S: MovementStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/till/open", post(open_till::<S>))
        .route("/till/close", post(close_till::<S>))
        .route("/till/status", get(till_status::<S>))
        .route("/till/sales", post(record_sale::<S>))
        .route(
            "/till/movements",
            get(list_movements::<S>).post(record_movement::<S>),
        )
        .route("/till/movements/{id}", get(get_movement::<S>))
}

// ============================================================================
// Requests
// ============================================================================

/// Request body for opening a day.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OpenTillRequest {
    /// Cash placed in the register.
    pub initial_amount: Decimal,
    /// Business day (defaults to today).
    pub date: Option<NaiveDate>,
}

/// Request body for recording a cash movement.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecordMovementRequest {
    /// Non-negative amount.
    pub amount: Decimal,
    /// "ingress" or "egress".
    pub kind: MovementKind,
    /// Free-text note.
    #[validate(length(max = 200))]
    pub note: Option<String>,
    /// Business day (defaults to today).
    pub date: Option<NaiveDate>,
}

/// Request body for recording the cash side of a sale.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RecordSaleRequest {
    /// Invoice number the sale was billed under.
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: String,
    /// Invoice total collected in cash.
    pub total: Decimal,
    /// Business day (defaults to today).
    pub date: Option<NaiveDate>,
}

/// Optional request body for closing a day.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CloseTillRequest {
    /// Business day (defaults to today).
    pub date: Option<NaiveDate>,
}

/// Query parameters for the status endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusParams {
    /// Day to report. Without it the oldest day still open is reported,
    /// or today when every earlier day is closed.
    pub date: Option<NaiveDate>,
}

/// Query parameters for listing movements.
#[derive(Debug, Deserialize)]
pub struct MovementsParams {
    /// Single day.
    pub date: Option<NaiveDate>,
    /// First day of a range.
    pub start_date: Option<NaiveDate>,
    /// Last day of a range.
    pub end_date: Option<NaiveDate>,
}

impl MovementsParams {
    /// Either `date` alone or both range bounds; nothing means today.
    fn selection(&self, today: NaiveDate) -> Option<DateSelection> {
        match (self.date, self.start_date, self.end_date) {
            (Some(date), None, None) => Some(DateSelection::Day(date)),
            (None, Some(start), Some(end)) => Some(DateSelection::Range { start, end }),
            (None, None, None) => Some(DateSelection::Day(today)),
            _ => None,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

/// A movement as returned to clients.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    /// Movement ID.
    pub id: i64,
    /// Business day.
    pub date: NaiveDate,
    /// Movement kind.
    pub kind: MovementKind,
    /// Amount with two decimals.
    pub amount: String,
    /// Free-text note.
    pub note: Option<String>,
    /// When the opening was settled by a close.
    pub settled_at: Option<DateTime<Utc>>,
    /// User who recorded the movement.
    pub created_by: Option<Uuid>,
    /// Audit timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Movement> for MovementResponse {
    fn from(m: Movement) -> Self {
        Self {
            id: m.id,
            date: m.date,
            kind: m.kind,
            amount: money(m.amount),
            note: m.note,
            settled_at: m.settled_at,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

fn movement_responses(movements: Vec<Movement>) -> Vec<MovementResponse> {
    movements.into_iter().map(MovementResponse::from).collect()
}

/// Response for a day's status.
#[derive(Debug, Serialize)]
pub struct TillStatusResponse {
    /// Business day reported.
    pub date: NaiveDate,
    /// Whether movements may still be recorded.
    pub is_open: bool,
    /// Live balance, or the closing balance once closed.
    pub balance: String,
    /// The day's opening while it is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening: Option<MovementResponse>,
    /// Active movements.
    pub movements: Vec<MovementResponse>,
    /// Display currency.
    pub currency_symbol: String,
}

impl TillStatusResponse {
    fn new(status: TillStatus, currency_symbol: &str) -> Self {
        Self {
            date: status.date,
            is_open: status.is_open,
            balance: money(status.balance),
            opening: status.opening.map(MovementResponse::from),
            movements: movement_responses(status.movements),
            currency_symbol: currency_symbol.to_string(),
        }
    }
}

/// Response for a close.
#[derive(Debug, Serialize)]
pub struct ClosingReportResponse {
    /// The closing summary movement.
    pub closing_movement: MovementResponse,
    /// Balance the day closed with.
    pub final_balance: String,
    /// The day's full trail.
    pub movements: Vec<MovementResponse>,
}

impl From<ClosingReport> for ClosingReportResponse {
    fn from(report: ClosingReport) -> Self {
        Self {
            closing_movement: report.closing_movement.into(),
            final_balance: money(report.final_balance),
            movements: movement_responses(report.movements),
        }
    }
}

/// Response for a movement listing.
#[derive(Debug, Serialize)]
pub struct MovementListResponse {
    /// Movements ordered by date, then id.
    pub movements: Vec<MovementResponse>,
    /// Signed sum of the listed movements, closing summaries excluded.
    pub balance: String,
    /// Display currency.
    pub currency_symbol: String,
}

impl MovementListResponse {
    fn new(query: MovementQuery, currency_symbol: &str) -> Self {
        Self {
            movements: movement_responses(query.movements),
            balance: money(query.balance),
            currency_symbol: currency_symbol.to_string(),
        }
    }
}

/// Maps a ledger error to its HTTP response.
///
/// Status and message come from the shared [`AppError`] taxonomy; the body
/// keeps the ledger's specific error code.
fn ledger_error_response(err: LedgerError) -> Response {
    let code = err.error_code();
    if err.category() == ErrorCategory::Conflict {
        warn!(code, error = %err, "Till request conflicts with day state");
    }

    let app_error = AppError::from(err);
    let status = StatusCode::from_u16(app_error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if app_error.is_internal() {
        error!(code, error = %app_error, "Till store failure");
        "An error occurred".to_string()
    } else {
        app_error.to_string()
    };

    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/till/open` - Open a business day.
async fn open_till<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<OpenTillRequest>,
) -> impl IntoResponse {
    let date = payload.date.unwrap_or_else(|| state.till.today());

    match state
        .ledger
        .open(date, payload.initial_amount, Some(auth.user_id()))
        .await
    {
        Ok(opening) => {
            (StatusCode::CREATED, Json(MovementResponse::from(opening))).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// POST `/till/movements` - Record an ingress or egress.
async fn record_movement<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<RecordMovementRequest>,
) -> impl IntoResponse {
    let date = payload.date.unwrap_or_else(|| state.till.today());

    match state
        .ledger
        .record(
            date,
            payload.kind,
            payload.amount,
            payload.note,
            Some(auth.user_id()),
        )
        .await
    {
        Ok(movement) => {
            (StatusCode::CREATED, Json(MovementResponse::from(movement))).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// POST `/till/sales` - Record the cash collected for an invoice.
async fn record_sale<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<RecordSaleRequest>,
) -> impl IntoResponse {
    let date = payload.date.unwrap_or_else(|| state.till.today());

    match state
        .ledger
        .record_sale(
            date,
            &payload.invoice_number,
            payload.total,
            Some(auth.user_id()),
        )
        .await
    {
        Ok(movement) => {
            (StatusCode::CREATED, Json(MovementResponse::from(movement))).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// POST `/till/close` - Close a business day. The body is optional.
async fn close_till<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    payload: Option<ValidatedJson<CloseTillRequest>>,
) -> impl IntoResponse {
    let payload = payload.map(|ValidatedJson(p)| p).unwrap_or_default();
    let date = payload.date.unwrap_or_else(|| state.till.today());

    match state.ledger.close(date, Some(auth.user_id())).await {
        Ok(report) => {
            (StatusCode::OK, Json(ClosingReportResponse::from(report))).into_response()
        }
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/till/status` - Snapshot of a day.
async fn till_status<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    _auth: AuthUser,
    Query(params): Query<StatusParams>,
) -> impl IntoResponse {
    let result = match params.date {
        Some(date) => state.ledger.status(date).await,
        None => state.ledger.current_status(state.till.today()).await,
    };

    match result {
        Ok(status) => (
            StatusCode::OK,
            Json(TillStatusResponse::new(status, &state.till.currency_symbol)),
        )
            .into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/till/movements` - Audit trail of a day or an inclusive range.
async fn list_movements<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    _auth: AuthUser,
    Query(params): Query<MovementsParams>,
) -> impl IntoResponse {
    let Some(selection) = params.selection(state.till.today()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_query",
                "message": "Use either date, or start_date together with end_date"
            })),
        )
            .into_response();
    };

    match state.ledger.query(selection).await {
        Ok(query) => (
            StatusCode::OK,
            Json(MovementListResponse::new(query, &state.till.currency_symbol)),
        )
            .into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET `/till/movements/{id}` - A single movement.
async fn get_movement<S: MovementStore + 'static>(
    State(state): State<AppState<S>>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.ledger.movement(id).await {
        Ok(movement) => (StatusCode::OK, Json(MovementResponse::from(movement))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}
