//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! All resource routes are nested under `/api/v1`:
//!
//! - **Rooms** (`/rooms/*`): Room inventory, occupancy status and deletion
//! - **Tenants** (`/tenants/*`): Move-in, transfer, move-out, meter readings and payments
//! - **Billing** (`/billing/*`): Statements, unpaid tenancies, summary, period rollover, exports
//!   and tenant notifications
//! - **Bills** (`/bills/*`): Issued invoice records
//! - **Meter readings** (`/meter-readings/*`): The electricity meter feed
//! - **Maintenance** (`/maintenance/*`): Occupancy consistency repair
//!
//! # OpenAPI Documentation
//!
//! Endpoints are documented with `utoipa` annotations. Interactive docs are served at `/docs`.

pub mod handlers;
pub mod models;
