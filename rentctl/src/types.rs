//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`RoomId`]: Room identifier
//! - [`TenantId`]: Tenant identifier (the canonical tenant identity, unlike the citizen ID which is
//!   only a lookup key)
//! - [`BillId`]: Invoice record identifier

use uuid::Uuid;

// Type aliases for IDs
pub type RoomId = Uuid;
pub type TenantId = Uuid;
pub type BillId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
