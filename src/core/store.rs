//! Persistence seam.
//!
//! The core assumes a store with atomic single-entity read-modify-write.
//! Writes are version-checked: a write whose `version` no longer matches the
//! stored entity fails with `Conflict`, which serializes concurrent
//! conflicting transitions (exactly one wins). Two multi-entity operations
//! exist because route edits commit together with their member point writes,
//! and an assignment run commits a new route together with its member
//! points.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::collection_points::models::{CollectionPoint, PointStatus};
use crate::features::collection_routes::models::{Route, RouteStatus};

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_point(&self, point: CollectionPoint) -> Result<CollectionPoint>;
    async fn point(&self, id: Uuid) -> Result<CollectionPoint>;
    /// Version-checked write. Bumps the version on success.
    async fn update_point(&self, point: CollectionPoint) -> Result<CollectionPoint>;
    /// Pending points eligible for a planning run: undated, or dated within
    /// `[date, date + horizon_days)`.
    async fn pending_points_for(
        &self,
        date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<CollectionPoint>>;

    async fn route(&self, id: Uuid) -> Result<Route>;
    /// Version-checked write. Bumps the version on success.
    async fn update_route(&self, route: Route) -> Result<Route>;
    /// The collector's currently running route, if any.
    async fn in_progress_route_for(&self, collector_id: Uuid) -> Result<Option<Route>>;

    /// Apply one route write and a batch of member point writes as a single
    /// atomic unit.
    async fn update_route_and_points(
        &self,
        route: Route,
        points: Vec<CollectionPoint>,
    ) -> Result<(Route, Vec<CollectionPoint>)>;

    /// Single-point convenience over `update_route_and_points`.
    async fn update_point_and_route(
        &self,
        point: CollectionPoint,
        route: Route,
    ) -> Result<(CollectionPoint, Route)> {
        let (route, mut points) = self.update_route_and_points(route, vec![point]).await?;
        let point = points
            .pop()
            .ok_or_else(|| AppError::Store("batched write returned no point".to_string()))?;
        Ok((point, route))
    }

    /// Persist a new route together with its member point writes,
    /// all-or-nothing.
    async fn commit_assignment(
        &self,
        route: Route,
        points: Vec<CollectionPoint>,
    ) -> Result<(Route, Vec<CollectionPoint>)>;
}

#[derive(Default)]
struct StoreState {
    points: HashMap<Uuid, CollectionPoint>,
    routes: HashMap<Uuid, Route>,
}

/// In-memory store. Backs the test suite and any single-process deployment;
/// a database-backed implementation satisfies the same contract.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_point_write(
        state: &mut StoreState,
        mut point: CollectionPoint,
    ) -> Result<CollectionPoint> {
        let current = state
            .points
            .get(&point.id)
            .ok_or_else(|| AppError::NotFound(format!("Collection point '{}' not found", point.id)))?;
        if current.version != point.version {
            return Err(AppError::Conflict(format!(
                "Collection point '{}' was modified concurrently",
                point.id
            )));
        }
        point.version += 1;
        state.points.insert(point.id, point.clone());
        Ok(point)
    }

    fn apply_route_write(state: &mut StoreState, mut route: Route) -> Result<Route> {
        let current = state
            .routes
            .get(&route.id)
            .ok_or_else(|| AppError::NotFound(format!("Route '{}' not found", route.id)))?;
        if current.version != route.version {
            return Err(AppError::Conflict(format!(
                "Route '{}' was modified concurrently",
                route.id
            )));
        }
        route.version += 1;
        state.routes.insert(route.id, route.clone());
        Ok(route)
    }

    fn check_point_version(state: &StoreState, point: &CollectionPoint) -> Result<()> {
        let current = state
            .points
            .get(&point.id)
            .ok_or_else(|| AppError::NotFound(format!("Collection point '{}' not found", point.id)))?;
        if current.version != point.version {
            return Err(AppError::Conflict(format!(
                "Collection point '{}' was modified concurrently",
                point.id
            )));
        }
        Ok(())
    }

    fn check_route_version(state: &StoreState, route: &Route) -> Result<()> {
        let current = state
            .routes
            .get(&route.id)
            .ok_or_else(|| AppError::NotFound(format!("Route '{}' not found", route.id)))?;
        if current.version != route.version {
            return Err(AppError::Conflict(format!(
                "Route '{}' was modified concurrently",
                route.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_point(&self, point: CollectionPoint) -> Result<CollectionPoint> {
        let mut state = self.state.write().await;
        if state.points.contains_key(&point.id) {
            return Err(AppError::Conflict(format!(
                "Collection point '{}' already exists",
                point.id
            )));
        }
        state.points.insert(point.id, point.clone());
        Ok(point)
    }

    async fn point(&self, id: Uuid) -> Result<CollectionPoint> {
        let state = self.state.read().await;
        state
            .points
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Collection point '{}' not found", id)))
    }

    async fn update_point(&self, point: CollectionPoint) -> Result<CollectionPoint> {
        let mut state = self.state.write().await;
        Self::apply_point_write(&mut state, point)
    }

    async fn pending_points_for(
        &self,
        date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<CollectionPoint>> {
        let state = self.state.read().await;
        let horizon_end = date + chrono::Duration::days(i64::from(horizon_days));
        let mut eligible: Vec<CollectionPoint> = state
            .points
            .values()
            .filter(|p| p.status == PointStatus::Pending)
            .filter(|p| match p.scheduled_date {
                None => true,
                Some(d) => d >= date && d < horizon_end,
            })
            .cloned()
            .collect();
        eligible.sort_by_key(|p| p.created_at);
        Ok(eligible)
    }

    async fn route(&self, id: Uuid) -> Result<Route> {
        let state = self.state.read().await;
        state
            .routes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Route '{}' not found", id)))
    }

    async fn update_route(&self, route: Route) -> Result<Route> {
        let mut state = self.state.write().await;
        Self::apply_route_write(&mut state, route)
    }

    async fn in_progress_route_for(&self, collector_id: Uuid) -> Result<Option<Route>> {
        let state = self.state.read().await;
        Ok(state
            .routes
            .values()
            .find(|r| r.collector_id == collector_id && r.status == RouteStatus::InProgress)
            .cloned())
    }

    async fn update_route_and_points(
        &self,
        route: Route,
        points: Vec<CollectionPoint>,
    ) -> Result<(Route, Vec<CollectionPoint>)> {
        let mut state = self.state.write().await;
        // Validate every version before touching anything
        Self::check_route_version(&state, &route)?;
        for point in &points {
            Self::check_point_version(&state, point)?;
        }

        let mut written = Vec::with_capacity(points.len());
        for point in points {
            written.push(Self::apply_point_write(&mut state, point)?);
        }
        let route = Self::apply_route_write(&mut state, route)?;
        Ok((route, written))
    }

    async fn commit_assignment(
        &self,
        route: Route,
        points: Vec<CollectionPoint>,
    ) -> Result<(Route, Vec<CollectionPoint>)> {
        let mut state = self.state.write().await;
        if state.routes.contains_key(&route.id) {
            return Err(AppError::Conflict(format!(
                "Route '{}' already exists",
                route.id
            )));
        }
        for point in &points {
            Self::check_point_version(&state, point)?;
        }

        let mut written = Vec::with_capacity(points.len());
        for point in points {
            written.push(Self::apply_point_write(&mut state, point)?);
        }
        state.routes.insert(route.id, route.clone());
        Ok((route, written))
    }
}
