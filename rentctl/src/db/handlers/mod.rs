//! Repository implementations, one per table.

pub mod bills;
pub mod meter_readings;
pub mod repository;
pub mod rooms;
pub mod tenants;

pub use bills::Bills;
pub use meter_readings::MeterReadings;
pub use repository::Repository;
pub use rooms::Rooms;
pub use tenants::Tenants;
