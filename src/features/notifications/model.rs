use serde::{Deserialize, Serialize};

/// Status-change events delivered to citizens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    PickupScheduled,
    CollectorOnTheWay,
    PickupCollected,
    PickupCancelled,
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationEvent::PickupScheduled => write!(f, "pickup_scheduled"),
            NotificationEvent::CollectorOnTheWay => write!(f, "collector_on_the_way"),
            NotificationEvent::PickupCollected => write!(f, "pickup_collected"),
            NotificationEvent::PickupCancelled => write!(f, "pickup_cancelled"),
        }
    }
}
