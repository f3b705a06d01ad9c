//! Invoice record management.

use super::{
    BillingCalculator,
    charges::{MAX_AMOUNT, amount_in_range},
};
use crate::{
    db::models::bills::{Bill, BillCreateDBRequest, BillFilter, BillUpdateDBRequest},
    errors::{Error, Result},
    types::{BillId, abbrev_uuid},
};
use rust_decimal::Decimal;
use tracing::instrument;

fn ensure_amount(field: &str, amount: Option<Decimal>) -> Result<()> {
    if amount.is_some_and(|a| a.is_sign_negative()) {
        return Err(Error::invalid_input(format!("{field} must not be negative")));
    }
    if amount.is_some_and(|a| !amount_in_range(a)) {
        return Err(Error::invalid_input(format!("{field} must not exceed {MAX_AMOUNT}")));
    }
    Ok(())
}

impl BillingCalculator {
    #[instrument(skip_all, fields(tenant_id = %abbrev_uuid(&request.tenant_id)), err)]
    pub async fn create_bill(&self, request: BillCreateDBRequest) -> Result<Bill> {
        ensure_amount("electricity", Some(request.electricity))?;
        ensure_amount("water", Some(request.water))?;
        ensure_amount("room_price", Some(request.room_price))?;

        let mut tx = self.store.begin().await?;
        if tx.room(request.room_id).await?.is_none() {
            return Err(Error::not_found("Room", request.room_id));
        }
        if tx.tenant(request.tenant_id).await?.is_none() {
            return Err(Error::not_found("Tenant", request.tenant_id));
        }
        let bill = tx.create_bill(&request).await?;
        tx.commit().await?;

        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn bill(&self, id: BillId) -> Result<Bill> {
        let mut tx = self.store.begin().await?;
        let bill = tx.bill(id).await?.ok_or_else(|| Error::not_found("Bill", id))?;
        tx.commit().await?;
        Ok(bill)
    }

    #[instrument(skip(self), err)]
    pub async fn bills(&self, filter: BillFilter) -> Result<Vec<Bill>> {
        let mut tx = self.store.begin().await?;
        let bills = tx.bills(&filter).await?;
        tx.commit().await?;
        Ok(bills)
    }

    /// Edit a bill's amounts; the total is recomputed from the resulting components
    #[instrument(skip(self, request), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn update_bill(&self, id: BillId, request: BillUpdateDBRequest) -> Result<Bill> {
        ensure_amount("electricity", request.electricity)?;
        ensure_amount("water", request.water)?;
        ensure_amount("room_price", request.room_price)?;

        let mut tx = self.store.begin().await?;
        if tx.bill(id).await?.is_none() {
            return Err(Error::not_found("Bill", id));
        }
        let bill = tx.update_bill(id, &request).await?;
        tx.commit().await?;

        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_bill(&self, id: BillId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_bill(id).await? {
            return Err(Error::not_found("Bill", id));
        }
        tx.commit().await?;
        Ok(())
    }
}
