/// Earth's radius in meters (for Haversine formula)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Reason recorded on member points when their route is cancelled
pub const ROUTE_CANCELLED_REASON: &str = "route cancelled";
