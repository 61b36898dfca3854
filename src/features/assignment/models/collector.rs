use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::geo::GeoPoint;

/// Collector input to a planning run. User management itself lives outside
/// the core; only the fields the planner reads are carried here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collector {
    pub id: Uuid,
    pub name: String,
    /// Maximum points per route; falls back to the configured default.
    pub capacity: Option<u32>,
    /// Seed for the nearest-neighbor walk; the first point of a chunk is
    /// used when unknown.
    pub last_location: Option<GeoPoint>,
    pub vehicle: Option<String>,
    pub active: bool,
}

impl Collector {
    pub fn capacity_or(&self, default: u32) -> u32 {
        self.capacity.unwrap_or(default)
    }
}
