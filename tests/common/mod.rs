#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use verdecoleta_core::core::config::PlannerConfig;
use verdecoleta_core::core::store::MemoryStore;
use verdecoleta_core::features::assignment::models::Collector;
use verdecoleta_core::features::assignment::AssignmentService;
use verdecoleta_core::features::collection_points::dtos::CreatePointDto;
use verdecoleta_core::features::collection_points::models::{Priority, QuantityUnit, WasteType};
use verdecoleta_core::features::collection_points::PointService;
use verdecoleta_core::features::collection_routes::RouteService;
use verdecoleta_core::features::notifications::{NotificationEvent, NotificationSender};
use verdecoleta_core::shared::geo::GeoPoint;

/// Notification double that records every emitted event.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Uuid, NotificationEvent)>>,
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        event: NotificationEvent,
        _payload: serde_json::Value,
    ) -> Result<(), String> {
        self.sent.lock().unwrap().push((user_id, event));
        Ok(())
    }
}

impl RecordingNotifier {
    pub fn events_for(&self, user_id: Uuid) -> Vec<NotificationEvent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, e)| *e)
            .collect()
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub points: PointService,
    pub routes: RouteService,
    pub assignment: AssignmentService,
}

/// Install the test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_app() -> TestApp {
    test_app_with(PlannerConfig::default())
}

pub fn test_app_with(config: PlannerConfig) -> TestApp {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    TestApp {
        points: PointService::new(store.clone(), notifier.clone()),
        routes: RouteService::new(store.clone(), notifier.clone(), config.clone()),
        assignment: AssignmentService::new(store.clone(), notifier.clone(), config),
        store,
        notifier,
    }
}

/// Valid pickup-request DTO; callers override what a scenario cares about.
pub fn point_dto(neighborhood: &str, lat: f64, lng: f64) -> CreatePointDto {
    CreatePointDto {
        citizen_id: Uuid::new_v4(),
        citizen_name: "Maria Silva".to_string(),
        phone: "+55 19 98765-4321".to_string(),
        email: None,
        street: "Rua das Flores".to_string(),
        number: "100".to_string(),
        neighborhood: neighborhood.to_string(),
        city: "Campinas".to_string(),
        latitude: lat,
        longitude: lng,
        waste_type: WasteType::Leaves,
        quantity_value: 3.0,
        quantity_unit: QuantityUnit::Bags,
        description: None,
        images: vec![],
        priority: Some(Priority::Normal),
        scheduled_date: None,
        time_window: None,
        recurrence: None,
    }
}

pub fn collector_with(capacity: u32, location: Option<GeoPoint>) -> Collector {
    Collector {
        id: Uuid::new_v4(),
        name: "João Coletor".to_string(),
        capacity: Some(capacity),
        last_location: location,
        vehicle: Some("caminhão 01".to_string()),
        active: true,
    }
}
