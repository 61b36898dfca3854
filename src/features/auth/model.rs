use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical role enum shared by every layer.
///
/// Exactly one spelling per role; the seed-data/front-end role string
/// mismatch class of bug is ruled out by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Collector,
    Citizen,
    /// Identity of the batch assignment run.
    Scheduler,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Collector => write!(f, "collector"),
            Role::Citizen => write!(f, "citizen"),
            Role::Scheduler => write!(f, "scheduler"),
        }
    }
}

/// The acting identity behind a mutation.
///
/// Resolved by the caller (token verification is outside the core); every
/// mutating service call takes one explicitly, there is no ambient identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Actor { id, role }
    }

    /// Actor used by the assignment run, so history entries always carry
    /// an identity.
    pub fn scheduler() -> Self {
        Actor {
            id: Uuid::nil(),
            role: Role::Scheduler,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_collector(&self) -> bool {
        self.role == Role::Collector
    }

    pub fn is_citizen(&self) -> bool {
        self.role == Role::Citizen
    }

    /// Admin or the scheduler batch identity.
    pub fn can_schedule(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_actor_can_schedule() {
        assert!(Actor::scheduler().can_schedule());
        assert!(Actor::new(Uuid::new_v4(), Role::Admin).can_schedule());
        assert!(!Actor::new(Uuid::new_v4(), Role::Collector).can_schedule());
        assert!(!Actor::new(Uuid::new_v4(), Role::Citizen).can_schedule());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Collector).unwrap(), "\"collector\"");
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
