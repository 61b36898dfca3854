use chrono::{NaiveDate, Utc};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use uuid::Uuid;

use crate::features::assignment::models::Collector;
use crate::features::auth::model::{Actor, Role};
use crate::features::collection_points::models::{
    Address, CollectionPoint, HistoryEntry, PointStatus, Priority, Quantity, QuantityUnit,
    WasteType,
};
use crate::features::collection_routes::models::Route;
use crate::shared::geo::GeoPoint;

pub fn pending_point() -> CollectionPoint {
    let citizen_id = Uuid::new_v4();
    let now = Utc::now();
    CollectionPoint {
        id: Uuid::new_v4(),
        version: 0,
        citizen_id,
        citizen_name: Name().fake(),
        phone: PhoneNumber().fake(),
        email: None,
        address: Address {
            street: "Rua das Flores".to_string(),
            number: "100".to_string(),
            neighborhood: "Centro".to_string(),
            city: "Campinas".to_string(),
        },
        location: GeoPoint { lat: -22.9099, lng: -47.0626 },
        waste_type: WasteType::Leaves,
        quantity: Quantity {
            value: 3.0,
            unit: QuantityUnit::Bags,
        },
        description: None,
        images: vec![],
        status: PointStatus::Pending,
        priority: Priority::Normal,
        scheduled_date: None,
        time_window: None,
        route_id: None,
        route_position: None,
        collector_id: None,
        history: vec![HistoryEntry {
            status: PointStatus::Pending,
            changed_by: Actor::new(citizen_id, Role::Citizen),
            changed_at: now,
            note: None,
        }],
        completion: None,
        feedback: None,
        cancellation: None,
        recurrence: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn route_for(collector_id: Uuid, points: Vec<Uuid>) -> Route {
    Route::new(
        "test route".to_string(),
        collector_id,
        Name().fake(),
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        points,
    )
}

pub fn collector(capacity: u32) -> Collector {
    Collector {
        id: Uuid::new_v4(),
        name: Name().fake(),
        capacity: Some(capacity),
        last_location: None,
        vehicle: None,
        active: true,
    }
}
