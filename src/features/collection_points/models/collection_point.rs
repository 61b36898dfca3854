use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::auth::model::Actor;
use crate::shared::geo::GeoPoint;

/// Collection point status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Pending,
    Scheduled,
    InProgress,
    Collected,
    Cancelled,
}

impl PointStatus {
    /// Directed edges of the point lifecycle. No skipping, except
    /// direct-to-cancelled from any non-terminal state.
    pub fn can_transition_to(self, to: PointStatus) -> bool {
        use PointStatus::*;
        matches!(
            (self, to),
            (Pending, Scheduled)
                | (Scheduled, InProgress)
                | (InProgress, Collected)
                | (Pending, Cancelled)
                | (Scheduled, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PointStatus::Collected | PointStatus::Cancelled)
    }
}

impl std::fmt::Display for PointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointStatus::Pending => write!(f, "pending"),
            PointStatus::Scheduled => write!(f, "scheduled"),
            PointStatus::InProgress => write!(f, "in_progress"),
            PointStatus::Collected => write!(f, "collected"),
            PointStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Waste type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteType {
    Leaves,
    Branches,
    Grass,
    Flowers,
    Fruit,
    Vegetables,
    Other,
}

/// Priority enum; ordering is used by the assignment run (urgent first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    Kg,
    Bags,
    CubicMeters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: QuantityUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: PointStatus,
    pub changed_by: Actor,
    pub changed_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Data recorded on the transition to collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub collected_at: DateTime<Utc>,
    pub actual_quantity: Option<Quantity>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_by: Actor,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Weekly,
    Biweekly,
    Monthly,
}

/// Auto-regeneration rule: after completion a fresh pending point is created
/// dated per the frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: RecurrenceFrequency,
    /// Day-of-month anchor for monthly recurrence (1..=28).
    pub day_of_month: Option<u32>,
}

/// One citizen's pickup request and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPoint {
    pub id: Uuid,
    /// Optimistic-concurrency token; bumped by every store write.
    pub version: u64,

    // Requester (denormalized)
    pub citizen_id: Uuid,
    pub citizen_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Address,
    pub location: GeoPoint,

    // Request details
    pub waste_type: WasteType,
    pub quantity: Quantity,
    pub description: Option<String>,
    pub images: Vec<String>,

    // Workflow
    pub status: PointStatus,
    pub priority: Priority,
    pub scheduled_date: Option<NaiveDate>,
    pub time_window: Option<(NaiveTime, NaiveTime)>,
    pub route_id: Option<Uuid>,
    pub route_position: Option<u32>,
    pub collector_id: Option<Uuid>,

    pub history: Vec<HistoryEntry>,
    pub completion: Option<Completion>,
    pub feedback: Option<Feedback>,
    pub cancellation: Option<Cancellation>,
    pub recurrence: Option<Recurrence>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionPoint {
    /// Set a new status and append the matching history entry in one step.
    ///
    /// The only mutation path for `status`; keeps the invariant that the last
    /// history entry always matches the current status.
    pub fn record_status(&mut self, status: PointStatus, actor: Actor, note: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.history.push(HistoryEntry {
            status,
            changed_by: actor,
            changed_at: now,
            note,
        });
    }

    /// Whether `collector` is the one assigned to this point.
    pub fn is_assigned_to(&self, collector: Uuid) -> bool {
        self.collector_id == Some(collector)
    }

    /// Attach the point to a route and mark it scheduled.
    ///
    /// Pairs the route linkage with the status change so the
    /// "route non-null iff scheduled/in_progress/collected" invariant cannot
    /// be split across writes. Authorization is the caller's job.
    pub fn schedule_into(
        &mut self,
        route_id: Uuid,
        collector_id: Uuid,
        scheduled_date: NaiveDate,
        position: u32,
        actor: Actor,
    ) {
        self.route_id = Some(route_id);
        self.route_position = Some(position);
        self.collector_id = Some(collector_id);
        self.scheduled_date = Some(scheduled_date);
        self.record_status(PointStatus::Scheduled, actor, None);
    }

    /// Detach from a route and return to the pending pool.
    ///
    /// Only used by route editing while the route is still pending; records
    /// a history entry so the status/history invariant holds.
    pub fn unschedule(&mut self, actor: Actor, note: Option<String>) {
        self.route_id = None;
        self.route_position = None;
        self.collector_id = None;
        self.record_status(PointStatus::Pending, actor, note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use PointStatus::*;
        assert!(Pending.can_transition_to(Scheduled));
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Collected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        // No skipping
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Collected));
        assert!(!Scheduled.can_transition_to(Collected));

        // No backwards edges, no exits from terminal states
        assert!(!Scheduled.can_transition_to(Pending));
        assert!(!Collected.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Collected.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states() {
        assert!(PointStatus::Collected.is_terminal());
        assert!(PointStatus::Cancelled.is_terminal());
        assert!(!PointStatus::Pending.is_terminal());
        assert!(!PointStatus::Scheduled.is_terminal());
        assert!(!PointStatus::InProgress.is_terminal());
    }

    #[test]
    fn priority_orders_urgent_highest() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PointStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(PointStatus::InProgress.to_string(), "in_progress");
    }
}
