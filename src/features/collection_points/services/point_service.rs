use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::store::Store;
use crate::features::auth::guards;
use crate::features::auth::model::Actor;
use crate::features::collection_points::dtos::{CreatePointDto, FeedbackDto, TransitionPayload};
use crate::features::collection_points::models::{
    Address, CollectionPoint, Completion, Feedback, Cancellation, HistoryEntry, PointStatus,
    Priority, Recurrence, RecurrenceFrequency,
};
use crate::features::collection_routes::models::{Route, RouteStatus};
use crate::features::notifications::model::NotificationEvent;
use crate::features::notifications::service::NotificationSender;
use crate::shared::geo::GeoPoint;

/// Service for the collection-point lifecycle.
pub struct PointService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationSender>,
}

impl PointService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self { store, notifier }
    }

    /// Register a new pickup request. Status starts at pending with the
    /// first history entry already in place.
    pub async fn create_point(&self, dto: CreatePointDto) -> Result<CollectionPoint> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let location = GeoPoint::new(dto.latitude, dto.longitude)?;
        if let Some(rec) = &dto.recurrence {
            validate_recurrence(rec)?;
        }

        let requester = Actor::new(dto.citizen_id, crate::features::auth::model::Role::Citizen);
        let now = Utc::now();
        let point = CollectionPoint {
            id: Uuid::new_v4(),
            version: 0,
            citizen_id: dto.citizen_id,
            citizen_name: dto.citizen_name.clone(),
            phone: dto.phone.clone(),
            email: dto.email.clone(),
            address: Address {
                street: dto.street.clone(),
                number: dto.number.clone(),
                neighborhood: dto.neighborhood.clone(),
                city: dto.city.clone(),
            },
            location,
            waste_type: dto.waste_type,
            quantity: dto.quantity(),
            description: dto.description.clone(),
            images: dto.images.clone(),
            status: PointStatus::Pending,
            priority: dto.priority.unwrap_or(Priority::Normal),
            scheduled_date: dto.scheduled_date,
            time_window: dto.time_window,
            route_id: None,
            route_position: None,
            collector_id: None,
            history: vec![HistoryEntry {
                status: PointStatus::Pending,
                changed_by: requester,
                changed_at: now,
                note: None,
            }],
            completion: None,
            feedback: None,
            cancellation: None,
            recurrence: dto.recurrence,
            created_at: now,
            updated_at: now,
        };

        let point = self.store.insert_point(point).await?;
        tracing::info!(point_id = %point.id, citizen = %point.citizen_id, "pickup request created");
        Ok(point)
    }

    /// Apply one lifecycle transition.
    ///
    /// Repeating an already-applied transition (target equals the current
    /// status) is a no-op success and appends nothing to the history, but
    /// only for an actor entitled to it. A concurrent loser observes either
    /// that same idempotent success or a stale-state `InvalidTransition`.
    pub async fn transition(
        &self,
        point_id: Uuid,
        actor: Actor,
        to: PointStatus,
        payload: TransitionPayload,
    ) -> Result<CollectionPoint> {
        let point = self.store.point(point_id).await?;
        let route = match point.route_id {
            Some(route_id) => Some(self.store.route(route_id).await?),
            None => None,
        };

        if point.status == to {
            authorize_repeat(actor, &point, route.as_ref(), to)?;
            tracing::debug!(point_id = %point.id, status = %to, "transition already applied");
            return Ok(point);
        }
        if !point.status.can_transition_to(to) {
            return Err(AppError::invalid_transition(point.status, to));
        }
        guards::can_transition(actor, &point, route.as_ref(), to)?;

        let seen_version = point.version;

        let result = match to {
            PointStatus::Scheduled => Err(AppError::Validation(
                "Points are scheduled by route creation or an assignment run".to_string(),
            )),
            PointStatus::InProgress => self.start_point(point, route, actor, payload).await,
            PointStatus::Collected => self.collect_point(point, route, actor, payload).await,
            PointStatus::Cancelled => self.cancel_point(point, route, actor, payload).await,
            PointStatus::Pending => Err(AppError::invalid_transition(PointStatus::Pending, to)),
        };

        match result {
            Err(AppError::Conflict(msg)) => {
                // Possibly lost a concurrent race: report idempotent success
                // if the winner reached the same state, a stale-state error
                // if the point moved elsewhere under us, and pass the
                // conflict through untouched when it was not a write race.
                let fresh = self.store.point(point_id).await?;
                if fresh.status == to {
                    Ok(fresh)
                } else if fresh.version != seen_version {
                    Err(AppError::invalid_transition(fresh.status, to))
                } else {
                    Err(AppError::Conflict(msg))
                }
            }
            other => other,
        }
    }

    /// scheduled -> in_progress. Auto-starts a still-pending route.
    async fn start_point(
        &self,
        mut point: CollectionPoint,
        route: Option<Route>,
        actor: Actor,
        payload: TransitionPayload,
    ) -> Result<CollectionPoint> {
        let mut route = route.ok_or_else(|| {
            AppError::Validation("Scheduled point has no route attached".to_string())
        })?;

        match route.status {
            RouteStatus::InProgress => {}
            RouteStatus::Pending => {
                if route.points.is_empty() {
                    return Err(AppError::Validation(
                        "Route has no collection points".to_string(),
                    ));
                }
                if let Some(active) = self.store.in_progress_route_for(route.collector_id).await? {
                    if active.id != route.id {
                        return Err(AppError::Conflict(format!(
                            "Collector already has route '{}' in progress",
                            active.id
                        )));
                    }
                }
                route.status = RouteStatus::InProgress;
                route.started_at = Some(Utc::now());
                route.updated_at = Utc::now();
            }
            RouteStatus::Completed | RouteStatus::Cancelled => {
                return Err(AppError::Validation(format!(
                    "Route '{}' is {} and cannot be executed",
                    route.id, route.status
                )));
            }
        }

        point.record_status(PointStatus::InProgress, actor, payload.note);
        let (point, route) = self.store.update_point_and_route(point, route).await?;
        tracing::info!(point_id = %point.id, route_id = %route.id, "collection started");

        self.emit(
            point.citizen_id,
            NotificationEvent::CollectorOnTheWay,
            json!({ "pointId": point.id, "routeId": route.id }),
        )
        .await;
        Ok(point)
    }

    /// in_progress -> collected. Records completion data, bumps route
    /// counters, re-evaluates route completion and spawns the recurrence
    /// follow-up.
    async fn collect_point(
        &self,
        mut point: CollectionPoint,
        route: Option<Route>,
        actor: Actor,
        payload: TransitionPayload,
    ) -> Result<CollectionPoint> {
        let route = route.ok_or_else(|| {
            AppError::Validation("Point in progress has no route attached".to_string())
        })?;

        let now = Utc::now();
        point.completion = Some(Completion {
            collected_at: now,
            actual_quantity: payload.actual_quantity,
            notes: payload.collector_notes.clone(),
            photos: payload.photos.clone(),
            duration_minutes: payload.duration_minutes,
        });
        point.record_status(PointStatus::Collected, actor, payload.note);

        let route = self.refresh_route_counters(route, &point).await?;
        let (point, route) = self.store.update_point_and_route(point, route).await?;
        tracing::info!(
            point_id = %point.id,
            route_id = %route.id,
            completed = route.completed_points,
            total = route.total_points,
            "collection completed"
        );

        self.emit(
            point.citizen_id,
            NotificationEvent::PickupCollected,
            json!({ "pointId": point.id, "routeId": route.id }),
        )
        .await;

        if point.recurrence.is_some() {
            self.spawn_recurrence(&point).await;
        }
        Ok(point)
    }

    /// pending/scheduled/in_progress -> cancelled.
    async fn cancel_point(
        &self,
        mut point: CollectionPoint,
        route: Option<Route>,
        actor: Actor,
        payload: TransitionPayload,
    ) -> Result<CollectionPoint> {
        let reason = payload
            .reason
            .clone()
            .ok_or_else(|| AppError::Validation("Cancellation requires a reason".to_string()))?;

        point.cancellation = Some(Cancellation {
            reason: reason.clone(),
            cancelled_by: actor,
            cancelled_at: Utc::now(),
        });
        // Stale route/collector references are kept for audit
        point.record_status(PointStatus::Cancelled, actor, Some(reason));

        let point = match route {
            Some(route) if !route.status.is_terminal() => {
                let route = self.refresh_route_counters(route, &point).await?;
                let (point, route) = self.store.update_point_and_route(point, route).await?;
                tracing::info!(point_id = %point.id, route_id = %route.id, "collection point cancelled");
                point
            }
            _ => {
                let point = self.store.update_point(point).await?;
                tracing::info!(point_id = %point.id, "collection point cancelled");
                point
            }
        };

        self.emit(
            point.citizen_id,
            NotificationEvent::PickupCancelled,
            json!({ "pointId": point.id }),
        )
        .await;
        Ok(point)
    }

    /// Attach feedback after collection. Not a state change, no history
    /// entry.
    pub async fn add_feedback(
        &self,
        point_id: Uuid,
        actor: Actor,
        dto: FeedbackDto,
    ) -> Result<CollectionPoint> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut point = self.store.point(point_id).await?;
        if point.status != PointStatus::Collected {
            return Err(AppError::Validation(format!(
                "Feedback is only accepted after collection (status is {})",
                point.status
            )));
        }
        let allowed = actor.is_admin() || (actor.is_citizen() && actor.id == point.citizen_id);
        if !allowed {
            return Err(AppError::Forbidden(
                "Only the requesting citizen or an admin may leave feedback".to_string(),
            ));
        }

        point.feedback = Some(Feedback {
            rating: dto.rating,
            comment: dto.comment,
        });
        point.updated_at = Utc::now();
        self.store.update_point(point).await
    }

    /// Recompute a route's counters from its member points, treating
    /// `updated` as already holding its new status, and close the route when
    /// every member is terminal.
    async fn refresh_route_counters(
        &self,
        mut route: Route,
        updated: &CollectionPoint,
    ) -> Result<Route> {
        let mut collected = 0u32;
        let mut all_terminal = true;
        for member_id in &route.points {
            let status = if *member_id == updated.id {
                updated.status
            } else {
                self.store.point(*member_id).await?.status
            };
            if status == PointStatus::Collected {
                collected += 1;
            }
            if !status.is_terminal() {
                all_terminal = false;
            }
        }

        route.completed_points = collected;
        route.total_points = route.points.len() as u32;
        if all_terminal && route.status == RouteStatus::InProgress {
            let now = Utc::now();
            route.status = RouteStatus::Completed;
            route.ended_at = Some(now);
            if let Some(started) = route.started_at {
                route.actual_duration_minutes =
                    Some(((now - started).num_minutes().max(0)) as u32);
            }
            tracing::info!(route_id = %route.id, "route completed");
        }
        route.updated_at = Utc::now();
        Ok(route)
    }

    /// Create the follow-up pending point for a recurring request.
    async fn spawn_recurrence(&self, completed: &CollectionPoint) {
        let Some(recurrence) = completed.recurrence else {
            return;
        };
        let base = completed
            .scheduled_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let Some(next_date) = next_occurrence(recurrence, base) else {
            tracing::warn!(point_id = %completed.id, "could not compute next recurrence date");
            return;
        };

        let now = Utc::now();
        let follow_up = CollectionPoint {
            id: Uuid::new_v4(),
            version: 0,
            status: PointStatus::Pending,
            scheduled_date: Some(next_date),
            route_id: None,
            route_position: None,
            collector_id: None,
            history: vec![HistoryEntry {
                status: PointStatus::Pending,
                changed_by: Actor::scheduler(),
                changed_at: now,
                note: Some(format!("recurring follow-up of {}", completed.id)),
            }],
            completion: None,
            feedback: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
            ..completed.clone()
        };

        match self.store.insert_point(follow_up).await {
            Ok(point) => {
                tracing::info!(
                    point_id = %point.id,
                    origin = %completed.id,
                    date = %next_date,
                    "recurring pickup scheduled"
                );
            }
            Err(e) => {
                tracing::warn!(origin = %completed.id, error = %e, "failed to create recurring follow-up");
            }
        }
    }

    /// Fire-and-forget notification; failure is logged, never propagated.
    async fn emit(&self, user_id: Uuid, event: NotificationEvent, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(user_id, event, payload).await {
            tracing::warn!(%user_id, %event, error = %e, "notification delivery failed");
        }
    }
}

/// Authorization for retrying an already-applied transition.
///
/// The regular guard keys on the pre-transition state (a citizen may cancel
/// only while pending, for example), so the actor recorded on the applied
/// transition repeats without re-deriving it; everyone else goes through the
/// regular guard.
fn authorize_repeat(
    actor: Actor,
    point: &CollectionPoint,
    route: Option<&Route>,
    to: PointStatus,
) -> Result<()> {
    let applied_by_actor = point
        .history
        .last()
        .is_some_and(|entry| entry.status == to && entry.changed_by == actor);
    if applied_by_actor {
        return Ok(());
    }
    guards::can_transition(actor, point, route, to)
}

fn validate_recurrence(recurrence: &Recurrence) -> Result<()> {
    if let Some(day) = recurrence.day_of_month {
        if !(1..=28).contains(&day) {
            return Err(AppError::Validation(
                "Recurrence day of month must be 1-28".to_string(),
            ));
        }
    }
    Ok(())
}

/// Next scheduled date for a recurring request, counted from `base`.
pub fn next_occurrence(recurrence: Recurrence, base: NaiveDate) -> Option<NaiveDate> {
    match recurrence.frequency {
        RecurrenceFrequency::Weekly => base.checked_add_days(Days::new(7)),
        RecurrenceFrequency::Biweekly => base.checked_add_days(Days::new(14)),
        RecurrenceFrequency::Monthly => {
            let next = base.checked_add_months(Months::new(1))?;
            match recurrence.day_of_month {
                Some(day) if day != next.day() => next.with_day(day),
                _ => Some(next),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_recurrence_adds_seven_days() {
        let rec = Recurrence {
            frequency: RecurrenceFrequency::Weekly,
            day_of_month: None,
        };
        let base = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            next_occurrence(rec, base),
            NaiveDate::from_ymd_opt(2026, 3, 9)
        );
    }

    #[test]
    fn biweekly_recurrence_adds_fourteen_days() {
        let rec = Recurrence {
            frequency: RecurrenceFrequency::Biweekly,
            day_of_month: None,
        };
        let base = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            next_occurrence(rec, base),
            NaiveDate::from_ymd_opt(2026, 3, 16)
        );
    }

    #[test]
    fn monthly_recurrence_honors_day_of_month() {
        let rec = Recurrence {
            frequency: RecurrenceFrequency::Monthly,
            day_of_month: Some(5),
        };
        let base = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(
            next_occurrence(rec, base),
            NaiveDate::from_ymd_opt(2026, 4, 5)
        );
    }

    #[test]
    fn invalid_recurrence_day_rejected() {
        let rec = Recurrence {
            frequency: RecurrenceFrequency::Monthly,
            day_of_month: Some(31),
        };
        assert!(validate_recurrence(&rec).is_err());
    }
}
