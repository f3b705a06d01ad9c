//! Request and response bodies for the HTTP API.
//!
//! Request bodies keep every field optional so that a missing field is reported as invalid
//! input by the service layer instead of being rejected during decoding.

pub mod billing;
pub mod bills;
pub mod meter_readings;
pub mod rooms;
pub mod tenants;
