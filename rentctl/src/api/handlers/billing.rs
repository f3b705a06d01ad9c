use crate::AppState;
use crate::api::models::billing::{AsOfQuery, BillingRunResponse};
use crate::billing::{BillingSummary, ResetOutcome, Statement, period::BillingPeriod};
use crate::email::{NoticeKind, NotificationReport, send_notices};
use crate::errors::{Error, Result};
use crate::export::{ExportReceipt, ExportRow};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/billing/statements",
    tag = "billing",
    summary = "Current statements",
    description = "Charges of every occupied room computed from the meter feed, ordered by room \
                   number. Rooms missing from the feed show no electricity; `amount_due` is the \
                   stored total once the room has been billed.",
    responses(
        (status = 200, description = "Statements", body = Vec<Statement>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_statements(State(state): State<AppState>) -> Result<Json<Vec<Statement>>> {
    Ok(Json(state.billing().statements(&state.meter_feed()).await?))
}

#[utoipa::path(
    get,
    path = "/billing/unpaid",
    tag = "billing",
    summary = "Unpaid tenancies",
    description = "Occupied tenancies not yet paid. Empty until the day of month is past the \
                   configured alert day.",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Unpaid statements", body = Vec<Statement>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_unpaid(State(state): State<AppState>, Query(query): Query<AsOfQuery>) -> Result<Json<Vec<Statement>>> {
    Ok(Json(state.billing().unpaid(query.date(), &state.meter_feed()).await?))
}

#[utoipa::path(
    get,
    path = "/billing/summary",
    tag = "billing",
    summary = "Billing summary",
    description = "Room, tenant and payment counts with revenue from paid tenancies. Computed \
                   on every request.",
    responses(
        (status = 200, description = "Summary", body = BillingSummary),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<BillingSummary>> {
    Ok(Json(state.billing().summary(&state.meter_feed()).await?))
}

#[utoipa::path(
    post,
    path = "/billing/charges",
    tag = "billing",
    summary = "Run billing",
    description = "Copies the meter feed onto every occupied tenancy and stores the totals. \
                   Rooms missing from the feed are charged no electricity.",
    responses(
        (status = 200, description = "Billing applied", body = BillingRunResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn apply_charges(State(state): State<AppState>) -> Result<Json<BillingRunResponse>> {
    let statements = state.billing().apply_meter_readings(&state.meter_feed()).await?;
    Ok(Json(BillingRunResponse {
        billed: statements.len(),
        statements,
    }))
}

#[utoipa::path(
    post,
    path = "/billing/periods/{period}/reset",
    tag = "billing",
    summary = "Start billing period",
    description = "Rolls every occupied tenancy into the period: the meter baseline moves to the \
                   latest reading, the stored total is cleared and payment is reset. Repeating \
                   the call for the same period changes nothing.",
    params(("period" = String, Path, description = "Billing period, `YYYY-MM`")),
    responses(
        (status = 200, description = "Period started", body = ResetOutcome),
        (status = 400, description = "Malformed period"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_period(State(state): State<AppState>, Path(period): Path<String>) -> Result<Json<ResetOutcome>> {
    let period: BillingPeriod = period.parse()?;
    Ok(Json(state.billing().reset_billing_period(period).await?))
}

#[utoipa::path(
    get,
    path = "/billing/export",
    tag = "billing",
    summary = "Preview export",
    responses(
        (status = 200, description = "Export rows", body = Vec<ExportRow>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn preview_export(State(state): State<AppState>) -> Result<Json<Vec<ExportRow>>> {
    Ok(Json(state.billing().export_rows(&state.meter_feed()).await?))
}

#[utoipa::path(
    post,
    path = "/billing/export",
    tag = "billing",
    summary = "Write export",
    description = "Writes the current export rows to the configured export sink.",
    responses(
        (status = 201, description = "Export written", body = ExportReceipt),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn write_export(State(state): State<AppState>) -> Result<(StatusCode, Json<ExportReceipt>)> {
    let rows = state.billing().export_rows(&state.meter_feed()).await?;
    let receipt = state.export_sink.write(&rows).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    post,
    path = "/billing/notifications/invoices",
    tag = "billing",
    summary = "Email invoices",
    description = "Emails every occupied tenancy with an address on file its current charges.",
    responses(
        (status = 200, description = "Invoices sent", body = NotificationReport),
        (status = 400, description = "Email is not enabled"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_invoices(State(state): State<AppState>) -> Result<Json<NotificationReport>> {
    let notifier = state
        .notifier
        .clone()
        .ok_or_else(|| Error::invalid_input("Email notifications are not enabled"))?;
    let statements = state.billing().statements(&state.meter_feed()).await?;
    Ok(Json(send_notices(notifier, &statements, NoticeKind::Invoice).await))
}

#[utoipa::path(
    post,
    path = "/billing/notifications/reminders",
    tag = "billing",
    summary = "Email payment reminders",
    description = "Emails a reminder to every unpaid tenancy. Sends nothing before the alert day.",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Reminders sent", body = NotificationReport),
        (status = 400, description = "Email is not enabled"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_reminders(State(state): State<AppState>, Query(query): Query<AsOfQuery>) -> Result<Json<NotificationReport>> {
    let notifier = state
        .notifier
        .clone()
        .ok_or_else(|| Error::invalid_input("Email notifications are not enabled"))?;
    let statements = state.billing().unpaid(query.date(), &state.meter_feed()).await?;
    Ok(Json(send_notices(notifier, &statements, NoticeKind::Reminder).await))
}
