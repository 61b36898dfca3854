use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Route status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Cancelled)
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteStatus::Pending => write!(f, "pending"),
            RouteStatus::InProgress => write!(f, "in_progress"),
            RouteStatus::Completed => write!(f, "completed"),
            RouteStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An ordered batch of collection points assigned to one collector for one
/// day. Never deleted, only soft-deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    /// Optimistic-concurrency token; bumped by every store write.
    pub version: u64,
    pub name: String,
    pub collector_id: Uuid,
    pub collector_name: String,
    pub scheduled_date: NaiveDate,

    /// Member point ids in delivery order; mutable only while pending.
    pub points: Vec<Uuid>,

    pub status: RouteStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Count of member points whose status is collected.
    pub completed_points: u32,
    /// Always equals `points.len()`.
    pub total_points: u32,

    pub estimated_duration_minutes: Option<u32>,
    pub actual_duration_minutes: Option<u32>,
    pub total_distance_m: Option<f64>,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        name: String,
        collector_id: Uuid,
        collector_name: String,
        scheduled_date: NaiveDate,
        points: Vec<Uuid>,
    ) -> Self {
        let now = Utc::now();
        let total_points = points.len() as u32;
        Route {
            id: Uuid::new_v4(),
            version: 0,
            name,
            collector_id,
            collector_name,
            scheduled_date,
            points,
            status: RouteStatus::Pending,
            started_at: None,
            ended_at: None,
            completed_points: 0,
            total_points,
            estimated_duration_minutes: None,
            actual_duration_minutes: None,
            total_distance_m: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, point_id: Uuid) -> bool {
        self.points.contains(&point_id)
    }

    /// Position of a point in delivery order.
    pub fn position_of(&self, point_id: Uuid) -> Option<u32> {
        self.points.iter().position(|p| *p == point_id).map(|p| p as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_route_starts_pending_with_consistent_counters() {
        let points = vec![Uuid::new_v4(), Uuid::new_v4()];
        let route = Route::new(
            "Centro - manhã".to_string(),
            Uuid::new_v4(),
            "João".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            points.clone(),
        );
        assert_eq!(route.status, RouteStatus::Pending);
        assert_eq!(route.total_points as usize, points.len());
        assert_eq!(route.completed_points, 0);
        assert!(route.active);
        assert_eq!(route.position_of(points[1]), Some(1));
    }

    #[test]
    fn terminal_states() {
        assert!(RouteStatus::Completed.is_terminal());
        assert!(RouteStatus::Cancelled.is_terminal());
        assert!(!RouteStatus::Pending.is_terminal());
        assert!(!RouteStatus::InProgress.is_terminal());
    }
}
