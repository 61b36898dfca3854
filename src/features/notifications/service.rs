use async_trait::async_trait;
use uuid::Uuid;

use crate::features::notifications::model::NotificationEvent;

/// Outbound message channel (e-mail/SMS/push live behind this seam).
///
/// Best-effort: delivery failure never affects the state transition that
/// triggered it. Callers log and move on.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        payload: serde_json::Value,
    ) -> std::result::Result<(), String>;
}

/// Sender that only logs. Default collaborator for tests and local runs.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSender for TracingNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        payload: serde_json::Value,
    ) -> std::result::Result<(), String> {
        tracing::info!(%user_id, %event, %payload, "notification dispatched");
        Ok(())
    }
}
