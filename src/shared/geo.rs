use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};
use crate::shared::constants::EARTH_RADIUS_METERS;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let point = GeoPoint { lat, lng };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

/// Great-circle distance between two points in meters (Haversine formula).
pub fn distance(a: GeoPoint, b: GeoPoint) -> Result<f64> {
    a.validate()?;
    b.validate()?;

    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    Ok(EARTH_RADIUS_METERS * c)
}

/// Greedy nearest-neighbor walk over `points`, starting from `start`.
///
/// Returns the visiting order as indices into `points` plus the total walked
/// distance in meters. Not globally optimal; good enough for intra-route
/// sequencing.
pub fn nearest_neighbor_order(start: GeoPoint, points: &[GeoPoint]) -> Result<(Vec<usize>, f64)> {
    start.validate()?;
    for point in points {
        point.validate()?;
    }

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut total = 0.0;
    let mut current = start;

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &idx) in remaining.iter().enumerate() {
            let d = distance(current, points[idx])?;
            if d < best_dist {
                best_dist = d;
                best_pos = pos;
            }
        }
        let idx = remaining.swap_remove(best_pos);
        current = points[idx];
        total += best_dist;
        order.push(idx);
    }

    Ok((order, total))
}
