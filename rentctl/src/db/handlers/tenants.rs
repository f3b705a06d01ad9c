//! Database repository for tenants.

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::tenants::{TenantCreateDBRequest, TenantDBResponse, TenantUpdateDBRequest},
    },
    types::{RoomId, TenantId, abbrev_uuid},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const TENANT_COLUMNS: &str = "id, citizen_id, name, phone, email, move_in_date, room_id, old_meter_reading, \
                              new_meter_reading, total_cost, is_paid, billing_period, created_at, updated_at";

/// Filter for listing tenants
#[derive(Debug, Clone, Default)]
pub struct TenantFilter {
    /// Only tenants with this citizen ID
    pub citizen_id: Option<String>,
    /// Lock the returned rows until the surrounding transaction ends
    pub for_update: bool,
}

impl TenantFilter {
    pub fn by_citizen_id(citizen_id: &str) -> Self {
        Self {
            citizen_id: Some(citizen_id.to_string()),
            for_update: true,
        }
    }
}

pub struct Tenants<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tenants<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get a tenant by ID and lock it for the rest of the transaction
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: TenantId) -> Result<Option<TenantDBResponse>> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1 FOR UPDATE");
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tenant)
    }

    /// Point the tenant at a room, or detach it with `None`
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    pub async fn set_room(&mut self, id: TenantId, room_id: Option<RoomId>) -> Result<TenantDBResponse> {
        let sql = format!("UPDATE tenants SET room_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {TENANT_COLUMNS}");
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&sql)
            .bind(id)
            .bind(room_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(tenant)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Tenants<'c> {
    type CreateRequest = TenantCreateDBRequest;
    type UpdateRequest = TenantUpdateDBRequest;
    type Response = TenantDBResponse;
    type Id = TenantId;
    type Filter = TenantFilter;

    #[instrument(skip(self, request), fields(room_id = %abbrev_uuid(&request.room_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sql = format!(
            "INSERT INTO tenants (id, citizen_id, name, phone, email, move_in_date, room_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TENANT_COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&sql)
            .bind(Uuid::new_v4())
            .bind(&request.citizen_id)
            .bind(&request.name)
            .bind(&request.phone)
            .bind(&request.email)
            .bind(request.move_in_date)
            .bind(request.room_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(tenant)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1");
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tenant)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE TRUE"));

        if let Some(citizen_id) = &filter.citizen_id {
            query.push(" AND citizen_id = ").push_bind(citizen_id.clone());
        }

        query.push(" ORDER BY created_at, id");
        if filter.for_update {
            query.push(" FOR UPDATE");
        }

        let tenants = query.build_query_as::<TenantDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(tenants)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sql = format!(
            "UPDATE tenants SET \
                name = COALESCE($2, name), \
                phone = COALESCE($3, phone), \
                email = COALESCE($4, email), \
                move_in_date = COALESCE($5, move_in_date), \
                old_meter_reading = COALESCE($6, old_meter_reading), \
                new_meter_reading = COALESCE($7, new_meter_reading), \
                total_cost = COALESCE($8, total_cost), \
                is_paid = COALESCE($9, is_paid), \
                billing_period = COALESCE($10, billing_period), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {TENANT_COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&sql)
            .bind(id)
            .bind(&request.name)
            .bind(&request.phone)
            .bind(&request.email)
            .bind(request.move_in_date)
            .bind(request.old_meter_reading)
            .bind(request.new_meter_reading)
            .bind(request.total_cost)
            .bind(request.is_paid)
            .bind(&request.billing_period)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(tenant)
    }
}
