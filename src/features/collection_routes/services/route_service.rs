use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::config::PlannerConfig;
use crate::core::error::{AppError, Result};
use crate::core::store::Store;
use crate::features::auth::guards;
use crate::features::auth::model::Actor;
use crate::features::collection_points::models::{CollectionPoint, PointStatus, Cancellation};
use crate::features::collection_routes::dtos::{CreateRouteDto, ReorderRouteDto};
use crate::features::collection_routes::models::{Route, RouteStatus};
use crate::features::notifications::model::NotificationEvent;
use crate::features::notifications::service::NotificationSender;
use crate::shared::constants::ROUTE_CANCELLED_REASON;
use crate::shared::geo;

/// Service for route construction and execution.
pub struct RouteService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationSender>,
    config: PlannerConfig,
}

impl RouteService {
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

    /// Manual route creation by an admin. All member points must be pending;
    /// the route and every point's scheduling commit together or not at all.
    pub async fn create_route(&self, dto: CreateRouteDto, actor: Actor) -> Result<Route> {
        guards::can_manage_route(actor)?;
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let unique: HashSet<Uuid> = dto.point_ids.iter().copied().collect();
        if unique.len() != dto.point_ids.len() {
            return Err(AppError::Validation(
                "Route contains duplicate collection points".to_string(),
            ));
        }
        if dto.point_ids.len() as u32 > self.config.max_points_per_route {
            return Err(AppError::CapacityExceeded(format!(
                "Route of {} points exceeds the maximum of {}",
                dto.point_ids.len(),
                self.config.max_points_per_route
            )));
        }

        let mut points = Vec::with_capacity(dto.point_ids.len());
        for point_id in &dto.point_ids {
            let point = self.store.point(*point_id).await?;
            if point.status != PointStatus::Pending {
                return Err(AppError::invalid_transition(
                    point.status,
                    PointStatus::Scheduled,
                ));
            }
            points.push(point);
        }

        let mut route = Route::new(
            dto.name.clone(),
            dto.collector_id,
            dto.collector_name.clone(),
            dto.scheduled_date,
            dto.point_ids.clone(),
        );
        let (distance_m, duration_min) = self.estimate_metrics(&points);
        route.total_distance_m = Some(distance_m);
        route.estimated_duration_minutes = Some(duration_min);

        for (position, point) in points.iter_mut().enumerate() {
            point.schedule_into(
                route.id,
                route.collector_id,
                route.scheduled_date,
                position as u32,
                actor,
            );
        }

        let (route, points) = self.store.commit_assignment(route, points).await?;
        tracing::info!(
            route_id = %route.id,
            collector = %route.collector_id,
            points = route.total_points,
            "route created"
        );

        for point in &points {
            self.emit(
                point.citizen_id,
                NotificationEvent::PickupScheduled,
                json!({
                    "pointId": point.id,
                    "routeId": route.id,
                    "scheduledDate": route.scheduled_date,
                }),
            )
            .await;
        }
        Ok(route)
    }

    /// Explicit route start by its collector. The same checks run when a
    /// collector starts the first point of a pending route.
    pub async fn start(&self, route_id: Uuid, actor: Actor) -> Result<Route> {
        let mut route = self.store.route(route_id).await?;
        if route.status == RouteStatus::InProgress {
            return Ok(route);
        }
        if route.status != RouteStatus::Pending {
            return Err(AppError::invalid_transition(
                route.status,
                RouteStatus::InProgress,
            ));
        }
        if !(actor.is_collector() && actor.id == route.collector_id) {
            return Err(AppError::Forbidden(
                "Only the assigned collector may start a route".to_string(),
            ));
        }
        if route.points.is_empty() {
            return Err(AppError::Validation(
                "Route has no collection points".to_string(),
            ));
        }
        if let Some(active) = self.store.in_progress_route_for(actor.id).await? {
            return Err(AppError::Conflict(format!(
                "Collector already has route '{}' in progress",
                active.id
            )));
        }

        route.status = RouteStatus::InProgress;
        route.started_at = Some(Utc::now());
        route.updated_at = Utc::now();
        let route = self.store.update_route(route).await?;
        tracing::info!(route_id = %route.id, "route started");
        Ok(route)
    }

    /// Rewrite the delivery order of a pending route. The new order must be
    /// a permutation of the current member set; positions are rewritten
    /// contiguously 0..n-1.
    pub async fn reorder(
        &self,
        route_id: Uuid,
        dto: ReorderRouteDto,
        actor: Actor,
    ) -> Result<Route> {
        guards::can_manage_route(actor)?;
        let mut route = self.store.route(route_id).await?;
        if route.status != RouteStatus::Pending {
            return Err(AppError::Validation(format!(
                "Only pending routes can be reordered (status is {})",
                route.status
            )));
        }

        let current: HashSet<Uuid> = route.points.iter().copied().collect();
        let proposed: HashSet<Uuid> = dto.point_ids.iter().copied().collect();
        if dto.point_ids.len() != route.points.len() || current != proposed {
            return Err(AppError::Validation(
                "New order must be a permutation of the route's current points".to_string(),
            ));
        }

        route.points = dto.point_ids;
        route.updated_at = Utc::now();

        let mut members = Vec::with_capacity(route.points.len());
        for (position, point_id) in route.points.iter().enumerate() {
            let mut point = self.store.point(*point_id).await?;
            point.route_position = Some(position as u32);
            point.updated_at = Utc::now();
            members.push(point);
        }
        let (route, _) = self.store.update_route_and_points(route, members).await?;

        tracing::info!(route_id = %route.id, "route reordered");
        Ok(route)
    }

    /// Remove a point from a pending route; the point returns to the
    /// pending pool and remaining positions close up.
    pub async fn remove_point(&self, route_id: Uuid, point_id: Uuid, actor: Actor) -> Result<Route> {
        guards::can_manage_route(actor)?;
        let mut route = self.store.route(route_id).await?;
        if route.status != RouteStatus::Pending {
            return Err(AppError::Validation(format!(
                "Points can only be removed while the route is pending (status is {})",
                route.status
            )));
        }
        if !route.contains(point_id) {
            return Err(AppError::NotFound(format!(
                "Collection point '{}' is not part of route '{}'",
                point_id, route_id
            )));
        }

        let mut point = self.store.point(point_id).await?;
        point.unschedule(actor, Some("removed from route".to_string()));

        route.points.retain(|p| *p != point_id);
        route.total_points = route.points.len() as u32;
        route.updated_at = Utc::now();

        // The freed point and the position close-up (0..n-1) commit with
        // the route write
        let mut writes = vec![point];
        for (position, member_id) in route.points.iter().enumerate() {
            let mut member = self.store.point(*member_id).await?;
            if member.route_position != Some(position as u32) {
                member.route_position = Some(position as u32);
                member.updated_at = Utc::now();
                writes.push(member);
            }
        }
        let (route, _) = self.store.update_route_and_points(route, writes).await?;

        tracing::info!(route_id = %route.id, point_id = %point_id, "point removed from route");
        Ok(route)
    }

    /// Cancel a route. Every non-terminal member point is forced to
    /// cancelled with a fixed reason.
    pub async fn cancel(&self, route_id: Uuid, actor: Actor, note: Option<String>) -> Result<Route> {
        let mut route = self.store.route(route_id).await?;
        if route.status == RouteStatus::Cancelled {
            return Ok(route);
        }
        if route.status == RouteStatus::Completed {
            return Err(AppError::invalid_transition(
                route.status,
                RouteStatus::Cancelled,
            ));
        }
        guards::can_cancel_route(actor, &route)?;

        // Members first: the route flips to cancelled only once every open
        // member is dealt with, so a cascade that fails midway can be
        // retried (terminal members are skipped on the next pass).
        for member_id in &route.points {
            let mut member = self.store.point(*member_id).await?;
            if member.status.is_terminal() {
                continue;
            }
            member.cancellation = Some(Cancellation {
                reason: ROUTE_CANCELLED_REASON.to_string(),
                cancelled_by: actor,
                cancelled_at: Utc::now(),
            });
            member.record_status(
                PointStatus::Cancelled,
                actor,
                Some(ROUTE_CANCELLED_REASON.to_string()),
            );
            let member = self.store.update_point(member).await?;
            self.emit(
                member.citizen_id,
                NotificationEvent::PickupCancelled,
                json!({ "pointId": member.id, "routeId": route.id }),
            )
            .await;
        }

        route.status = RouteStatus::Cancelled;
        route.ended_at = Some(Utc::now());
        route.updated_at = Utc::now();
        let route = self.store.update_route(route).await?;
        tracing::info!(route_id = %route.id, note = ?note, "route cancelled");
        Ok(route)
    }

    /// Soft-deactivation; routes are never deleted. Only terminal routes can
    /// be archived.
    pub async fn deactivate(&self, route_id: Uuid, actor: Actor) -> Result<Route> {
        guards::can_manage_route(actor)?;
        let mut route = self.store.route(route_id).await?;
        if !route.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Only completed or cancelled routes can be deactivated (status is {})",
                route.status
            )));
        }
        route.active = false;
        route.updated_at = Utc::now();
        self.store.update_route(route).await
    }

    /// Straight-line distance along the given order plus a per-point service
    /// time; good enough for dashboard estimates.
    fn estimate_metrics(&self, points: &[CollectionPoint]) -> (f64, u32) {
        let mut distance_m = 0.0;
        for pair in points.windows(2) {
            if let Ok(d) = geo::distance(pair[0].location, pair[1].location) {
                distance_m += d;
            }
        }
        let travel_minutes =
            (distance_m / 1000.0) / self.config.average_speed_kmh * 60.0;
        let service_minutes = self.config.minutes_per_point * points.len() as u32;
        (distance_m, travel_minutes.round() as u32 + service_minutes)
    }

    async fn emit(&self, user_id: Uuid, event: NotificationEvent, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(user_id, event, payload).await {
            tracing::warn!(%user_id, %event, error = %e, "notification delivery failed");
        }
    }
}
