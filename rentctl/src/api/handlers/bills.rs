use crate::AppState;
use crate::api::models::bills::{BillCreate, BillResponse, BillUpdate, ListBillsQuery};
use crate::errors::Result;
use crate::types::BillId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/bills",
    tag = "bills",
    summary = "List bills",
    description = "Newest first, optionally filtered by tenant or room.",
    params(ListBillsQuery),
    responses(
        (status = 200, description = "List of bills", body = Vec<BillResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_bills(State(state): State<AppState>, Query(query): Query<ListBillsQuery>) -> Result<Json<Vec<BillResponse>>> {
    let bills = state.billing().bills(query.into()).await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/bills",
    tag = "bills",
    summary = "Record bill",
    request_body = BillCreate,
    responses(
        (status = 201, description = "Bill recorded", body = BillResponse),
        (status = 400, description = "Missing field or negative amount"),
        (status = 404, description = "Room or tenant not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_bill(State(state): State<AppState>, Json(body): Json<BillCreate>) -> Result<(StatusCode, Json<BillResponse>)> {
    let bill = state.billing().create_bill(body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(BillResponse::from(bill))))
}

#[utoipa::path(
    get,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Get bill",
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill details", body = BillResponse),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<Json<BillResponse>> {
    Ok(Json(BillResponse::from(state.billing().bill(id).await?)))
}

#[utoipa::path(
    patch,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Edit bill",
    description = "Change any of the amounts. The total is recomputed.",
    request_body = BillUpdate,
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill updated", body = BillResponse),
        (status = 400, description = "Negative amount"),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_bill(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    Json(body): Json<BillUpdate>,
) -> Result<Json<BillResponse>> {
    let bill = state.billing().update_bill(id, body.into()).await?;
    Ok(Json(BillResponse::from(bill)))
}

#[utoipa::path(
    delete,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Delete bill",
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 204, description = "Bill deleted"),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_bill(State(state): State<AppState>, Path(id): Path<BillId>) -> Result<StatusCode> {
    state.billing().delete_bill(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::bills::BillResponse;
    use crate::api::models::rooms::RoomResponse;
    use crate::api::models::tenants::TenantResponse;
    use crate::test_utils::{create_test_server, room_body, tenant_body};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_bill_crud() {
        let (server, _harness) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        let tenant: TenantResponse = server.post("/api/v1/tenants").json(&tenant_body(room.id, "001")).await.json();

        let response = server
            .post("/api/v1/bills")
            .json(&json!({
                "room_id": room.id,
                "tenant_id": tenant.id,
                "electricity": "150000",
                "water": "100000",
                "room_price": "3000000",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let bill: BillResponse = response.json();
        assert_eq!(bill.total, Decimal::from(3_250_000));

        let updated: BillResponse = server
            .patch(&format!("/api/v1/bills/{}", bill.id))
            .json(&json!({ "water": "0" }))
            .await
            .json();
        assert_eq!(updated.total, Decimal::from(3_150_000));

        let listed: Vec<BillResponse> = server
            .get("/api/v1/bills")
            .add_query_param("tenant_id", tenant.id)
            .await
            .json();
        assert_eq!(listed.len(), 1);

        server
            .delete(&format!("/api/v1/bills/{}", bill.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server.get(&format!("/api/v1/bills/{}", bill.id)).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_create_bill_requires_references() {
        let (server, _harness) = create_test_server();

        server
            .post("/api/v1/bills")
            .json(&json!({ "room_price": "100" }))
            .await
            .assert_status_bad_request();

        server
            .post("/api/v1/bills")
            .json(&json!({
                "room_id": uuid::Uuid::new_v4(),
                "tenant_id": uuid::Uuid::new_v4(),
                "room_price": "100",
            }))
            .await
            .assert_status_not_found();
    }
}
