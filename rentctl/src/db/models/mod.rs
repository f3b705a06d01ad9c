//! Database models for rooms, tenants, invoices and meter feed records.

pub mod bills;
pub mod meter_readings;
pub mod rooms;
pub mod tenants;
