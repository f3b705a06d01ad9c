use crate::AppState;
use crate::api::models::bills::BillResponse;
use crate::api::models::tenants::{MeterReadingUpdate, TenantCreate, TenantResponse, TenantUpdate};
use crate::billing::Statement;
use crate::errors::{Error, Result};
use crate::types::TenantId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/tenants",
    tag = "tenants",
    summary = "List tenants",
    responses(
        (status = 200, description = "List of tenants", body = Vec<TenantResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tenants(State(state): State<AppState>) -> Result<Json<Vec<TenantResponse>>> {
    let tenants = state.occupancy().tenants().await?;
    Ok(Json(tenants.into_iter().map(TenantResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tenants",
    tag = "tenants",
    summary = "Move a tenant in",
    description = "Creates the tenant and occupies the given vacant room in one transaction.",
    request_body = TenantCreate,
    responses(
        (status = 201, description = "Tenant moved in", body = TenantResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room is occupied or citizen ID already registered"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_tenant(
    State(state): State<AppState>,
    Json(body): Json<TenantCreate>,
) -> Result<(StatusCode, Json<TenantResponse>)> {
    let tenant = state.occupancy().assign_tenant(body.into()).await?;
    Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

#[utoipa::path(
    get,
    path = "/tenants/{id}",
    tag = "tenants",
    summary = "Get tenant",
    params(("id" = uuid::Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant details", body = TenantResponse),
        (status = 404, description = "Tenant not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_tenant(State(state): State<AppState>, Path(id): Path<TenantId>) -> Result<Json<TenantResponse>> {
    let tenant = state.occupancy().tenant(id).await?;
    Ok(Json(TenantResponse::from(tenant)))
}

#[utoipa::path(
    patch,
    path = "/tenants/{id}",
    tag = "tenants",
    summary = "Update or transfer tenant",
    description = "Edit tenant details. A `room_id` different from the current room moves the \
                   tenant: the old room is vacated and the new one occupied in one transaction.",
    request_body = TenantUpdate,
    params(("id" = uuid::Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant updated", body = TenantResponse),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "Tenant or target room not found"),
        (status = 409, description = "Target room is occupied"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reassign_tenant(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<TenantUpdate>,
) -> Result<Json<TenantResponse>> {
    let tenant = state.occupancy().reassign_tenant(id, body.into()).await?;
    Ok(Json(TenantResponse::from(tenant)))
}

#[utoipa::path(
    get,
    path = "/tenants/by-citizen-id/{citizen_id}",
    tag = "tenants",
    summary = "Find tenant by citizen ID",
    params(("citizen_id" = String, Path, description = "Citizen ID")),
    responses(
        (status = 200, description = "Tenant details", body = TenantResponse),
        (status = 404, description = "No tenant with this citizen ID"),
        (status = 409, description = "Citizen ID matches more than one tenant"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_tenant_by_citizen_id(
    State(state): State<AppState>,
    Path(citizen_id): Path<String>,
) -> Result<Json<TenantResponse>> {
    let tenant = state.occupancy().tenant_by_citizen_id(&citizen_id).await?;
    Ok(Json(TenantResponse::from(tenant)))
}

#[utoipa::path(
    delete,
    path = "/tenants/by-citizen-id/{citizen_id}",
    tag = "tenants",
    summary = "Move a tenant out",
    description = "Vacates the tenant's room and removes the tenant in one transaction.",
    params(("citizen_id" = String, Path, description = "Citizen ID")),
    responses(
        (status = 204, description = "Tenant moved out"),
        (status = 404, description = "No tenant with this citizen ID"),
        (status = 409, description = "Citizen ID matches more than one tenant"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn release_tenant(State(state): State<AppState>, Path(citizen_id): Path<String>) -> Result<StatusCode> {
    state.occupancy().release_tenant(&citizen_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/tenants/by-citizen-id/{citizen_id}/payment",
    tag = "tenants",
    summary = "Confirm payment",
    description = "Marks the current period as paid. Confirming twice is harmless.",
    params(("citizen_id" = String, Path, description = "Citizen ID")),
    responses(
        (status = 200, description = "Payment confirmed", body = TenantResponse),
        (status = 404, description = "No tenant with this citizen ID"),
        (status = 409, description = "Citizen ID matches more than one tenant"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_payment(State(state): State<AppState>, Path(citizen_id): Path<String>) -> Result<Json<TenantResponse>> {
    let tenant = state.billing().confirm_payment(&citizen_id).await?;
    Ok(Json(TenantResponse::from(tenant)))
}

#[utoipa::path(
    put,
    path = "/tenants/{id}/meter-reading",
    tag = "tenants",
    summary = "Record meter reading",
    description = "Stores the tenant's latest electricity reading and the recomputed total.",
    request_body = MeterReadingUpdate,
    params(("id" = uuid::Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Reading recorded", body = Statement),
        (status = 400, description = "Missing or negative reading"),
        (status = 404, description = "Tenant not found"),
        (status = 409, description = "Tenant has no room"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn record_meter_reading(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<MeterReadingUpdate>,
) -> Result<Json<Statement>> {
    let new_reading = body
        .new_reading
        .ok_or_else(|| Error::invalid_input("new_reading is required"))?;
    let statement = state.billing().record_meter_reading(id, new_reading).await?;
    Ok(Json(statement))
}

#[utoipa::path(
    post,
    path = "/tenants/{id}/bills",
    tag = "tenants",
    summary = "Issue bill",
    description = "Freezes the tenant's current charges into an invoice record.",
    params(("id" = uuid::Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 201, description = "Bill issued", body = BillResponse),
        (status = 404, description = "Tenant not found"),
        (status = 409, description = "Tenant has no room"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn issue_bill(State(state): State<AppState>, Path(id): Path<TenantId>) -> Result<(StatusCode, Json<BillResponse>)> {
    let bill = state.billing().issue_bill(id).await?;
    Ok((StatusCode::CREATED, Json(BillResponse::from(bill))))
}

#[cfg(test)]
mod tests {
    use crate::api::models::rooms::RoomResponse;
    use crate::api::models::tenants::TenantResponse;
    use crate::billing::Statement;
    use crate::db::models::rooms::RoomStatus;
    use crate::test_utils::{create_test_server, room_body, tenant_body};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_assign_tenant_occupies_room() {
        let (server, _) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();

        let response = server.post("/api/v1/tenants").json(&tenant_body(room.id, "001")).await;
        response.assert_status(StatusCode::CREATED);
        let tenant: TenantResponse = response.json();
        assert_eq!(tenant.room.as_ref().map(|r| r.id), Some(room.id));
        assert!(!tenant.is_paid);
        assert_eq!(tenant.total_cost, Decimal::ZERO);

        let room: RoomResponse = server.get(&format!("/api/v1/rooms/{}", room.id)).await.json();
        assert_eq!(room.status, RoomStatus::Occupied);
        assert_eq!(room.tenant.map(|t| t.id), Some(tenant.id));
    }

    #[tokio::test]
    async fn test_assign_to_occupied_room_conflicts() {
        let (server, _) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        server
            .post("/api/v1/tenants")
            .json(&tenant_body(room.id, "001"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post("/api/v1/tenants").json(&tenant_body(room.id, "002")).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "conflict");

        let tenants: Vec<TenantResponse> = server.get("/api/v1/tenants").await.json();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].citizen_id, "001");
    }

    #[tokio::test]
    async fn test_assign_tenant_missing_fields() {
        let (server, _) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();

        let response = server
            .post("/api/v1/tenants")
            .json(&json!({ "room_id": room.id, "citizen_id": "001" }))
            .await;
        response.assert_status_bad_request();

        let response = server.post("/api/v1/tenants").json(&json!({ "name": "Lan" })).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_transfer_tenant_between_rooms() {
        let (server, _) = create_test_server();
        let a: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        let b: RoomResponse = server.post("/api/v1/rooms").json(&room_body("102")).await.json();
        let tenant: TenantResponse = server.post("/api/v1/tenants").json(&tenant_body(a.id, "001")).await.json();

        let moved: TenantResponse = server
            .patch(&format!("/api/v1/tenants/{}", tenant.id))
            .json(&json!({ "room_id": b.id }))
            .await
            .json();
        assert_eq!(moved.room.map(|r| r.room_number), Some("102".to_string()));

        let a: RoomResponse = server.get(&format!("/api/v1/rooms/{}", a.id)).await.json();
        let b: RoomResponse = server.get(&format!("/api/v1/rooms/{}", b.id)).await.json();
        assert_eq!(a.status, RoomStatus::Vacant);
        assert_eq!(b.status, RoomStatus::Occupied);
        assert_eq!(b.tenant.map(|t| t.id), Some(tenant.id));
    }

    #[tokio::test]
    async fn test_release_unknown_tenant_not_found() {
        let (server, _) = create_test_server();
        let response = server.delete("/api/v1/tenants/by-citizen-id/999").await;
        response.assert_status_not_found();
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_meter_reading_and_payment() {
        let (server, _) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        let tenant: TenantResponse = server.post("/api/v1/tenants").json(&tenant_body(room.id, "001")).await.json();

        server
            .put(&format!("/api/v1/tenants/{}/meter-reading", tenant.id))
            .json(&json!({}))
            .await
            .assert_status_bad_request();
        server
            .put(&format!("/api/v1/tenants/{}/meter-reading", tenant.id))
            .json(&json!({ "new_reading": -1 }))
            .await
            .assert_status_bad_request();

        let statement: Statement = server
            .put(&format!("/api/v1/tenants/{}/meter-reading", tenant.id))
            .json(&json!({ "new_reading": 50 }))
            .await
            .json();
        assert_eq!(statement.charges.total, Decimal::from(3_250_000));
        assert_eq!(statement.billed_total, Decimal::from(3_250_000));

        let paid: TenantResponse = server.post("/api/v1/tenants/by-citizen-id/001/payment").await.json();
        assert!(paid.is_paid);
        assert_eq!(paid.total_cost, Decimal::from(3_250_000));

        // confirming again is a no-op success
        let again: TenantResponse = server.post("/api/v1/tenants/by-citizen-id/001/payment").await.json();
        assert!(again.is_paid);
        assert_eq!(again.total_cost, paid.total_cost);
    }

    #[tokio::test]
    async fn test_issue_bill_for_tenant() {
        let (server, _) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        let tenant: TenantResponse = server.post("/api/v1/tenants").json(&tenant_body(room.id, "001")).await.json();
        server
            .put(&format!("/api/v1/tenants/{}/meter-reading", tenant.id))
            .json(&json!({ "new_reading": 50 }))
            .await
            .assert_status_ok();

        let response = server.post(&format!("/api/v1/tenants/{}/bills", tenant.id)).await;
        response.assert_status(StatusCode::CREATED);
        let bill: crate::api::models::bills::BillResponse = response.json();
        assert_eq!(bill.total, Decimal::from(3_250_000));
        assert_eq!(bill.room_id, room.id);
    }
}
