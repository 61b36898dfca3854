pub mod model;
pub mod service;

pub use model::NotificationEvent;
pub use service::{NotificationSender, TracingNotifier};
