//! Role-based authorization guards for lifecycle mutations.
//!
//! Pure functions: the structural validity of a transition is checked first
//! by the state machine (`InvalidTransition`); these guards only decide
//! whether the *actor* may perform an otherwise-valid mutation, and deny
//! with `Forbidden`.
//!
//! Actor rules for point transitions:
//! - pending -> scheduled: admin or the scheduler batch identity
//! - scheduled -> in_progress, in_progress -> collected: the collector who
//!   owns the point's route
//! - -> cancelled: admin always; the requesting citizen only while pending;
//!   the assigned collector only while assigned

use crate::core::error::{AppError, Result};
use crate::features::auth::model::Actor;
use crate::features::collection_points::models::{CollectionPoint, PointStatus};
use crate::features::collection_routes::models::Route;

/// Authorize `actor` to move `point` to `to`.
///
/// `route` must be the point's current route when the point has one; route
/// ownership is checked against it for execution transitions.
pub fn can_transition(
    actor: Actor,
    point: &CollectionPoint,
    route: Option<&Route>,
    to: PointStatus,
) -> Result<()> {
    match to {
        PointStatus::Scheduled => {
            if actor.can_schedule() {
                Ok(())
            } else {
                Err(AppError::Forbidden(format!(
                    "Role {} cannot schedule collection points",
                    actor.role
                )))
            }
        }
        PointStatus::InProgress | PointStatus::Collected => {
            require_owning_collector(actor, route)
        }
        PointStatus::Cancelled => can_cancel(actor, point),
        PointStatus::Pending => Err(AppError::Forbidden(
            "No actor may move a point back to pending".to_string(),
        )),
    }
}

/// Execution transitions require the collector the route is assigned to.
fn require_owning_collector(actor: Actor, route: Option<&Route>) -> Result<()> {
    let route = route.ok_or_else(|| {
        AppError::Forbidden("Point is not attached to a route".to_string())
    })?;
    if !actor.is_collector() {
        return Err(AppError::Forbidden(format!(
            "Role {} cannot execute collections",
            actor.role
        )));
    }
    if route.collector_id != actor.id {
        return Err(AppError::Forbidden(
            "Route is assigned to another collector".to_string(),
        ));
    }
    Ok(())
}

fn can_cancel(actor: Actor, point: &CollectionPoint) -> Result<()> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.is_citizen() {
        if actor.id != point.citizen_id {
            return Err(AppError::Forbidden(
                "Only the requesting citizen may cancel their own pickup".to_string(),
            ));
        }
        if point.status != PointStatus::Pending {
            return Err(AppError::Forbidden(
                "Citizens may only cancel while the request is pending".to_string(),
            ));
        }
        return Ok(());
    }
    if actor.is_collector() {
        if point.is_assigned_to(actor.id) {
            return Ok(());
        }
        return Err(AppError::Forbidden(
            "Collectors may only cancel points assigned to them".to_string(),
        ));
    }
    Err(AppError::Forbidden(format!(
        "Role {} cannot cancel collection points",
        actor.role
    )))
}

/// Route structure mutations (create, reorder, remove, deactivate) are
/// admin-only; cancelling a route is admin or its own collector.
pub fn can_manage_route(actor: Actor) -> Result<()> {
    if actor.is_admin() || actor.role == crate::features::auth::model::Role::Scheduler {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} cannot manage routes",
            actor.role
        )))
    }
}

pub fn can_cancel_route(actor: Actor, route: &Route) -> Result<()> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.is_collector() && route.collector_id == actor.id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Only an admin or the assigned collector may cancel a route".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::shared::test_helpers::{pending_point, route_for};
    use uuid::Uuid;

    #[test]
    fn only_admin_or_scheduler_schedules() {
        let point = pending_point();
        assert!(can_transition(
            Actor::new(Uuid::new_v4(), Role::Admin),
            &point,
            None,
            PointStatus::Scheduled
        )
        .is_ok());
        assert!(can_transition(Actor::scheduler(), &point, None, PointStatus::Scheduled).is_ok());
        assert!(matches!(
            can_transition(
                Actor::new(Uuid::new_v4(), Role::Collector),
                &point,
                None,
                PointStatus::Scheduled
            ),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn foreign_collector_cannot_execute() {
        let collector = Uuid::new_v4();
        let point = pending_point();
        let route = route_for(collector, vec![point.id]);
        let intruder = Actor::new(Uuid::new_v4(), Role::Collector);
        assert!(matches!(
            can_transition(intruder, &point, Some(&route), PointStatus::InProgress),
            Err(AppError::Forbidden(_))
        ));
        let owner = Actor::new(collector, Role::Collector);
        assert!(can_transition(owner, &point, Some(&route), PointStatus::InProgress).is_ok());
    }

    #[test]
    fn citizen_cancels_only_own_pending_request() {
        let mut point = pending_point();
        let requester = Actor::new(point.citizen_id, Role::Citizen);
        assert!(can_transition(requester, &point, None, PointStatus::Cancelled).is_ok());

        let stranger = Actor::new(Uuid::new_v4(), Role::Citizen);
        assert!(matches!(
            can_transition(stranger, &point, None, PointStatus::Cancelled),
            Err(AppError::Forbidden(_))
        ));

        point.record_status(PointStatus::Scheduled, Actor::scheduler(), None);
        assert!(matches!(
            can_transition(requester, &point, None, PointStatus::Cancelled),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn collector_cancels_only_assigned_points() {
        let collector = Uuid::new_v4();
        let mut point = pending_point();
        point.record_status(PointStatus::Scheduled, Actor::scheduler(), None);
        point.collector_id = Some(collector);
        assert!(can_transition(
            Actor::new(collector, Role::Collector),
            &point,
            None,
            PointStatus::Cancelled
        )
        .is_ok());
        assert!(matches!(
            can_transition(
                Actor::new(Uuid::new_v4(), Role::Collector),
                &point,
                None,
                PointStatus::Cancelled
            ),
            Err(AppError::Forbidden(_))
        ));
    }
}
