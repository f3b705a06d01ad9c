use crate::AppState;
use crate::api::models::rooms::{ListRoomsQuery, RoomCreate, RoomResponse, RoomUpdate};
use crate::errors::Result;
use crate::types::RoomId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    summary = "List rooms",
    description = "Rooms ordered by room number, each with its derived status and occupant.",
    params(ListRoomsQuery),
    responses(
        (status = 200, description = "List of rooms", body = Vec<RoomResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_rooms(State(state): State<AppState>, Query(query): Query<ListRoomsQuery>) -> Result<Json<Vec<RoomResponse>>> {
    let rooms = state.occupancy().rooms(query.occupied).await?;
    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    summary = "Create room",
    request_body = RoomCreate,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Room number already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_room(State(state): State<AppState>, Json(body): Json<RoomCreate>) -> Result<(StatusCode, Json<RoomResponse>)> {
    let room = state.occupancy().create_room(body.into()).await?;
    Ok((StatusCode::CREATED, Json(RoomResponse::from(room))))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    summary = "Get room",
    params(("id" = uuid::Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 404, description = "Room not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_room(State(state): State<AppState>, Path(id): Path<RoomId>) -> Result<Json<RoomResponse>> {
    let room = state.occupancy().room(id).await?;
    Ok(Json(RoomResponse::from(room)))
}

#[utoipa::path(
    patch,
    path = "/rooms/{id}",
    tag = "rooms",
    summary = "Update room",
    description = "Edit room attributes. Changing the price or fixture counts of an occupied room \
                   recomputes the occupant's stored total.",
    request_body = RoomUpdate,
    params(("id" = uuid::Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room updated", body = RoomResponse),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room number already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<RoomId>,
    Json(body): Json<RoomUpdate>,
) -> Result<Json<RoomResponse>> {
    let room = state.occupancy().update_room(id, body.into()).await?;
    Ok(Json(RoomResponse::from(room)))
}

#[utoipa::path(
    delete,
    path = "/rooms/{id}",
    tag = "rooms",
    summary = "Delete room",
    description = "Only vacant rooms can be deleted.",
    params(("id" = uuid::Uuid, Path, description = "Room ID")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room is occupied"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_room(State(state): State<AppState>, Path(id): Path<RoomId>) -> Result<StatusCode> {
    state.occupancy().delete_room(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
