//! Database repository for invoice records.

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::bills::{BillCreateDBRequest, BillDBResponse, BillFilter, BillUpdateDBRequest},
    },
    types::{BillId, abbrev_uuid},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const BILL_COLUMNS: &str = "id, room_id, tenant_id, electricity, water, room_price, total, created_at, updated_at";

pub struct Bills<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bills<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Bills<'c> {
    type CreateRequest = BillCreateDBRequest;
    type UpdateRequest = BillUpdateDBRequest;
    type Response = BillDBResponse;
    type Id = BillId;
    type Filter = BillFilter;

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&request.tenant_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sql = format!(
            "INSERT INTO bills (id, room_id, tenant_id, electricity, water, room_price, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {BILL_COLUMNS}"
        );
        let bill = sqlx::query_as::<_, BillDBResponse>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.room_id)
            .bind(request.tenant_id)
            .bind(request.electricity)
            .bind(request.water)
            .bind(request.room_price)
            .bind(request.total())
            .fetch_one(&mut *self.db)
            .await?;

        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
        let bill = sqlx::query_as::<_, BillDBResponse>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(bill)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {BILL_COLUMNS} FROM bills WHERE TRUE"));

        if let Some(tenant_id) = filter.tenant_id {
            query.push(" AND tenant_id = ").push_bind(tenant_id);
        }
        if let Some(room_id) = filter.room_id {
            query.push(" AND room_id = ").push_bind(room_id);
        }
        query.push(" ORDER BY created_at DESC, id");

        let bills = query.build_query_as::<BillDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(bills)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Edit bill amounts. The total is recomputed from the resulting components in the same
    /// statement, so it can never drift from them.
    #[instrument(skip(self, request), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sql = format!(
            "UPDATE bills SET \
                electricity = COALESCE($2, electricity), \
                water = COALESCE($3, water), \
                room_price = COALESCE($4, room_price), \
                total = COALESCE($2, electricity) + COALESCE($3, water) + COALESCE($4, room_price), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {BILL_COLUMNS}"
        );
        let bill = sqlx::query_as::<_, BillDBResponse>(&sql)
            .bind(id)
            .bind(request.electricity)
            .bind(request.water)
            .bind(request.room_price)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(bill)
    }
}
