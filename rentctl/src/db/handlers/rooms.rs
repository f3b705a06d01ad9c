//! Database repository for rooms.

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::rooms::{RoomCreateDBRequest, RoomDBResponse, RoomUpdateDBRequest},
    },
    types::{RoomId, TenantId, abbrev_uuid},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const ROOM_COLUMNS: &str = "id, room_number, floor, price, bathroom_count, shower_count, tenant_id, created_at, updated_at";

/// Filter for listing rooms
#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    /// `Some(true)` for occupied rooms only, `Some(false)` for vacant rooms only
    pub occupied: Option<bool>,
    /// Lock the returned rows until the surrounding transaction ends
    pub for_update: bool,
}

pub struct Rooms<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Rooms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get a room by ID and lock it for the rest of the transaction
    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_update(&mut self, id: RoomId) -> Result<Option<RoomDBResponse>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE");
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_number(&mut self, room_number: &str) -> Result<Option<RoomDBResponse>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE room_number = $1 FOR UPDATE");
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(room_number)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room)
    }

    /// Point the room at a tenant, or clear it with `None`
    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    pub async fn set_tenant(&mut self, id: RoomId, tenant_id: Option<TenantId>) -> Result<RoomDBResponse> {
        let sql = format!("UPDATE rooms SET tenant_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {ROOM_COLUMNS}");
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(room)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Rooms<'c> {
    type CreateRequest = RoomCreateDBRequest;
    type UpdateRequest = RoomUpdateDBRequest;
    type Response = RoomDBResponse;
    type Id = RoomId;
    type Filter = RoomFilter;

    #[instrument(skip(self, request), fields(room_number = %request.room_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sql = format!(
            "INSERT INTO rooms (id, room_number, floor, price, bathroom_count, shower_count) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ROOM_COLUMNS}"
        );
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(Uuid::new_v4())
            .bind(&request.room_number)
            .bind(request.floor)
            .bind(request.price)
            .bind(request.bathroom_count)
            .bind(request.shower_count)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(room)
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE TRUE"));

        match filter.occupied {
            Some(true) => {
                query.push(" AND tenant_id IS NOT NULL");
            }
            Some(false) => {
                query.push(" AND tenant_id IS NULL");
            }
            None => {}
        }

        query.push(" ORDER BY room_number");
        if filter.for_update {
            query.push(" FOR UPDATE");
        }

        let rooms = query.build_query_as::<RoomDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(rooms)
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(room_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sql = format!(
            "UPDATE rooms SET \
                room_number = COALESCE($2, room_number), \
                floor = COALESCE($3, floor), \
                price = COALESCE($4, price), \
                bathroom_count = COALESCE($5, bathroom_count), \
                shower_count = COALESCE($6, shower_count), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        );
        let room = sqlx::query_as::<_, RoomDBResponse>(&sql)
            .bind(id)
            .bind(&request.room_number)
            .bind(request.floor)
            .bind(request.price)
            .bind(request.bathroom_count)
            .bind(request.shower_count)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(room)
    }
}
