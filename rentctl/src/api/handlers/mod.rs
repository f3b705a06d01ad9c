//! HTTP request handlers for all API endpoints.
//!
//! Handlers decode the request, call the occupancy manager or billing calculator from
//! [`crate::AppState`], and convert the result into an API model. Validation and business rules
//! live in the service layer; errors propagate as [`crate::errors::Error`] and are rendered by its
//! `IntoResponse` implementation.
//!
//! - [`rooms`]: Room inventory
//! - [`tenants`]: Move-in, transfer, move-out, meter readings, payments and bill issue
//! - [`billing`]: Billing runs, period rollover, reports, exports and notifications
//! - [`bills`]: Invoice record CRUD
//! - [`meter_readings`]: The meter feed
//! - [`maintenance`]: Occupancy consistency repair

pub mod billing;
pub mod bills;
pub mod maintenance;
pub mod meter_readings;
pub mod rooms;
pub mod tenants;
