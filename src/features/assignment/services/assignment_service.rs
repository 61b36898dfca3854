//! Batch planning run: turns pending collection points into scheduled
//! routes.
//!
//! Greedy heuristic, not globally optimal: points are grouped by
//! neighborhood, ordered by priority then waiting time, chunked onto the
//! least-loaded collectors, and sequenced by a nearest-neighbor walk.
//! Callers are expected to hold a logical planning-run lock per date; the
//! run itself only guarantees per-route atomicity.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::core::config::PlannerConfig;
use crate::core::error::{AppError, Result};
use crate::core::store::Store;
use crate::features::assignment::models::Collector;
use crate::features::auth::model::Actor;
use crate::features::collection_points::models::CollectionPoint;
use crate::features::collection_routes::models::Route;
use crate::features::notifications::model::NotificationEvent;
use crate::features::notifications::service::NotificationSender;
use crate::shared::geo;

pub struct AssignmentService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationSender>,
    config: PlannerConfig,
}

impl AssignmentService {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn NotificationSender>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// One planning run for `date`.
    ///
    /// Returns the created routes (possibly empty when there is nothing to
    /// plan); `NoCapacityAvailable` when points exist but no collector can
    /// take any.
    pub async fn run_assignment(
        &self,
        date: NaiveDate,
        collectors: &[Collector],
    ) -> Result<Vec<Route>> {
        let eligible = self
            .store
            .pending_points_for(date, self.config.planning_horizon_days)
            .await?;
        if eligible.is_empty() {
            tracing::info!(%date, "assignment run: nothing to plan");
            return Ok(Vec::new());
        }

        let available: Vec<&Collector> = collectors
            .iter()
            .filter(|c| c.active && c.capacity_or(self.config.max_points_per_route) > 0)
            .collect();
        if available.is_empty() {
            tracing::warn!(%date, points = eligible.len(), "assignment run: no collector capacity");
            return Err(AppError::NoCapacityAvailable);
        }

        // Group by neighborhood; BTreeMap keeps runs deterministic.
        let mut groups: BTreeMap<String, Vec<CollectionPoint>> = BTreeMap::new();
        for point in eligible {
            groups
                .entry(point.address.neighborhood.to_lowercase())
                .or_default()
                .push(point);
        }

        // Load = points handed to a collector so far in this run.
        let mut loads: Vec<u32> = vec![0; available.len()];
        let mut routes_per_area: BTreeMap<String, u32> = BTreeMap::new();
        let mut created = Vec::new();

        for (neighborhood, mut group) in groups {
            // Priority breaks ties toward older requests
            group.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then(a.created_at.cmp(&b.created_at))
            });

            let mut remaining = group;
            while !remaining.is_empty() {
                let collector_idx = pick_collector(
                    &available,
                    &loads,
                    remaining.len(),
                    self.config.max_points_per_route,
                );
                let collector = available[collector_idx];
                let capacity = collector.capacity_or(self.config.max_points_per_route) as usize;
                let take = capacity.min(remaining.len());
                let chunk: Vec<CollectionPoint> = remaining.drain(..take).collect();
                loads[collector_idx] += take as u32;

                let seq = routes_per_area.entry(neighborhood.clone()).or_insert(0);
                *seq += 1;
                let name = if *seq == 1 && remaining.is_empty() {
                    format!("{} - {}", neighborhood, date)
                } else {
                    format!("{} - {} #{}", neighborhood, date, seq)
                };

                let route = self.build_route(name, collector, date, chunk).await?;
                created.push(route);
            }
        }

        tracing::info!(%date, routes = created.len(), "assignment run committed");
        Ok(created)
    }

    /// Sequence one chunk, persist the route with its point transitions
    /// atomically, and notify the citizens.
    async fn build_route(
        &self,
        name: String,
        collector: &Collector,
        date: NaiveDate,
        chunk: Vec<CollectionPoint>,
    ) -> Result<Route> {
        let locations: Vec<_> = chunk.iter().map(|p| p.location).collect();
        let seed = collector.last_location.unwrap_or(locations[0]);
        let (order, distance_m) = geo::nearest_neighbor_order(seed, &locations)?;

        let mut ordered = Vec::with_capacity(chunk.len());
        for idx in order {
            ordered.push(chunk[idx].clone());
        }

        let mut route = Route::new(
            name,
            collector.id,
            collector.name.clone(),
            date,
            ordered.iter().map(|p| p.id).collect(),
        );
        route.total_distance_m = Some(distance_m);
        let travel_minutes = (distance_m / 1000.0) / self.config.average_speed_kmh * 60.0;
        route.estimated_duration_minutes = Some(
            travel_minutes.round() as u32 + self.config.minutes_per_point * ordered.len() as u32,
        );

        let scheduler = Actor::scheduler();
        for (position, point) in ordered.iter_mut().enumerate() {
            point.schedule_into(route.id, collector.id, date, position as u32, scheduler);
        }

        let (route, points) = self.store.commit_assignment(route, ordered).await?;
        tracing::info!(
            route_id = %route.id,
            collector = %route.collector_id,
            points = route.total_points,
            distance_m = distance_m,
            "route assigned"
        );

        for point in &points {
            self.emit(
                point.citizen_id,
                NotificationEvent::PickupScheduled,
                json!({
                    "pointId": point.id,
                    "routeId": route.id,
                    "scheduledDate": date,
                }),
            )
            .await;
        }
        Ok(route)
    }

    async fn emit(&self, user_id: Uuid, event: NotificationEvent, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(user_id, event, payload).await {
            tracing::warn!(%user_id, %event, error = %e, "notification delivery failed");
        }
    }
}

/// Least-loaded collector whose per-route capacity covers the whole group;
/// when none does, the least-loaded overall (the group is split at its
/// capacity).
fn pick_collector(
    available: &[&Collector],
    loads: &[u32],
    group_size: usize,
    default_capacity: u32,
) -> usize {
    let covering = (0..available.len())
        .filter(|&i| available[i].capacity_or(default_capacity) as usize >= group_size)
        .min_by_key(|&i| loads[i]);
    match covering {
        Some(i) => i,
        None => (0..available.len()).min_by_key(|&i| loads[i]).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::collector;

    #[test]
    fn prefers_covering_collector_over_lighter_load() {
        let small = collector(2);
        let big = collector(10);
        let available = vec![&small, &big];
        // small is idle, big already carries 3, but only big covers 5 points
        let idx = pick_collector(&available, &[0, 3], 5, 20);
        assert_eq!(idx, 1);
    }

    #[test]
    fn splits_on_least_loaded_when_nobody_covers() {
        let a = collector(3);
        let b = collector(3);
        let available = vec![&a, &b];
        let idx = pick_collector(&available, &[2, 1], 9, 20);
        assert_eq!(idx, 1);
    }
}
