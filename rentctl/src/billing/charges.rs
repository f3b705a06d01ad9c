//! Pure charge computations.
//!
//! Every amount is a [`Decimal`] so currency never goes through floating point.

use crate::db::models::rooms::Room;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unit prices applied by the billing calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rates {
    /// Price per kWh consumed
    pub electricity_unit_rate: Decimal,
    /// Flat monthly price per bathroom or shower
    pub water_fixture_rate: Decimal,
}

/// Most bathrooms or showers a room may declare
pub const MAX_FIXTURES: i32 = 1_000;

/// Largest meter reading accepted from any source
pub const MAX_METER_READING: i64 = 1_000_000_000_000;

/// Largest price, rate or bill amount accepted, in currency units
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Whether `amount` is a non-negative value no larger than [`MAX_AMOUNT`]
pub fn amount_in_range(amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount <= Decimal::from(MAX_AMOUNT)
}

/// Electricity consumed between two meter readings. A reading that went backwards (meter reset or
/// replaced) counts as no consumption.
pub fn electricity_usage(old_reading: i64, new_reading: i64) -> i64 {
    new_reading.saturating_sub(old_reading).max(0)
}

pub fn electricity_cost(old_reading: i64, new_reading: i64, unit_rate: Decimal) -> Decimal {
    Decimal::from(electricity_usage(old_reading, new_reading)).saturating_mul(unit_rate)
}

pub fn water_cost(bathroom_count: i32, shower_count: i32, fixture_rate: Decimal) -> Decimal {
    let fixtures = i64::from(bathroom_count) + i64::from(shower_count);
    Decimal::from(fixtures).saturating_mul(fixture_rate)
}

/// The three components of a monthly charge and their sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChargeBreakdown {
    /// kWh consumed in the period
    pub electricity_usage: i64,
    #[schema(value_type = String)]
    pub electricity: Decimal,
    #[schema(value_type = String)]
    pub water: Decimal,
    #[schema(value_type = String)]
    pub room_price: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl ChargeBreakdown {
    pub fn compute(room: &Room, old_reading: i64, new_reading: i64, rates: &Rates) -> Self {
        let electricity = electricity_cost(old_reading, new_reading, rates.electricity_unit_rate);
        let water = water_cost(room.bathroom_count, room.shower_count, rates.water_fixture_rate);

        Self {
            electricity_usage: electricity_usage(old_reading, new_reading),
            electricity,
            water,
            room_price: room.price,
            total: electricity.saturating_add(water).saturating_add(room.price),
        }
    }

    /// Water and rent only, for a room with no meter record
    pub fn without_electricity(room: &Room, rates: &Rates) -> Self {
        Self::compute(room, 0, 0, rates)
    }
}

/// Total monthly charge for a room at the given readings
pub fn total_cost(room: &Room, old_reading: i64, new_reading: i64, rates: &Rates) -> Decimal {
    ChargeBreakdown::compute(room, old_reading, new_reading, rates).total
}
