//! Endpoint path construction.
//!
//! Paths only — query parameters are attached by the request builder, never
//! hand-encoded into strings.

use hireline_core::{LookupCategory, Resource};

/// Paged list / create endpoint for a resource.
#[must_use]
pub fn resource(resource: Resource) -> String {
    format!("/api/v1/{resource}")
}

/// By-id endpoint for a resource.
#[must_use]
pub fn resource_by_id(resource: Resource, id: &str) -> String {
    format!("/api/v1/{resource}/{id}")
}

/// Bulk-create endpoint for a resource.
#[must_use]
pub fn bulk(resource: Resource) -> String {
    format!("/api/v1/{resource}/bulk")
}

/// Duplicate probe by phone number.
#[must_use]
pub fn duplicate_check() -> String {
    "/api/v1/candidates/duplicate-check".to_string()
}

/// Duplicate probe by arbitrary field.
#[must_use]
pub fn duplicate_check_by_field(resource: Resource) -> String {
    format!("/api/v1/{resource}/duplicate-check")
}

/// Lookup category endpoint.
#[must_use]
pub fn lookup(category: LookupCategory) -> String {
    format!("/api/v1/lookups/{}", category.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable() {
        assert_eq!(resource(Resource::CallDetails), "/api/v1/call-details");
        assert_eq!(resource_by_id(Resource::Lineups, "lu-7"), "/api/v1/lineups/lu-7");
        assert_eq!(bulk(Resource::Walkins), "/api/v1/walkins/bulk");
        assert_eq!(lookup(LookupCategory::JobProfiles), "/api/v1/lookups/job-profiles");
    }
}
