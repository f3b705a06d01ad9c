use crate::AppState;
use crate::errors::Result;
use crate::occupancy::ReconcileReport;
use axum::{Json, extract::State};

#[utoipa::path(
    post,
    path = "/maintenance/reconcile",
    tag = "maintenance",
    summary = "Repair occupancy references",
    description = "Clears any room or tenant reference that is not matched by the other side. \
                   Never pairs records up; reassign tenants afterwards if needed.",
    responses(
        (status = 200, description = "What was repaired", body = ReconcileReport),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileReport>> {
    Ok(Json(state.occupancy().reconcile().await?))
}

#[cfg(test)]
mod tests {
    use crate::api::models::rooms::RoomResponse;
    use crate::occupancy::ReconcileReport;
    use crate::test_utils::{create_test_server, room_body, tenant_body};

    #[tokio::test]
    async fn test_reconcile_consistent_store_is_clean() {
        let (server, _harness) = create_test_server();
        let room: RoomResponse = server.post("/api/v1/rooms").json(&room_body("101")).await.json();
        server.post("/api/v1/tenants").json(&tenant_body(room.id, "001")).await.assert_status(axum::http::StatusCode::CREATED);

        let report: ReconcileReport = server.post("/api/v1/maintenance/reconcile").await.json();
        assert!(report.is_clean());
    }
}
