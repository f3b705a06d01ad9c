use crate::AppState;
use crate::api::models::meter_readings::{MeterReadingResponse, MeterReadingUpsert};
use crate::errors::Result;
use crate::meters::MeterReadingSource;
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/meter-readings",
    tag = "meter_readings",
    summary = "List meter feed",
    responses(
        (status = 200, description = "Feed records, one per room number", body = Vec<MeterReadingResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_meter_readings(State(state): State<AppState>) -> Result<Json<Vec<MeterReadingResponse>>> {
    let readings = state.meter_feed().readings().await?;
    Ok(Json(readings.into_iter().map(MeterReadingResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/meter-readings/{room_number}",
    tag = "meter_readings",
    summary = "Store meter reading",
    description = "Insert or replace the feed record for a room number. Applied to tenancies by \
                   the next billing run.",
    request_body = MeterReadingUpsert,
    params(("room_number" = String, Path, description = "Room number")),
    responses(
        (status = 200, description = "Reading stored", body = MeterReadingResponse),
        (status = 400, description = "Missing or negative reading"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(room_number = %room_number))]
pub async fn upsert_meter_reading(
    State(state): State<AppState>,
    Path(room_number): Path<String>,
    Json(body): Json<MeterReadingUpsert>,
) -> Result<Json<MeterReadingResponse>> {
    let request = body.into_request(room_number)?;
    let reading = state.meter_feed().record(&request).await?;
    Ok(Json(MeterReadingResponse::from(reading)))
}
