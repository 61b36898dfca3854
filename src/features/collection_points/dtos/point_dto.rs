use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::features::collection_points::models::{
    Priority, Quantity, QuantityUnit, Recurrence, WasteType,
};
use crate::shared::validation::PHONE_REGEX;

/// Request DTO for creating a pickup request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePointDto {
    pub citizen_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub citizen_name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Street must be 1-255 characters"))]
    pub street: String,

    #[validate(length(min = 1, max = 32, message = "Number must be 1-32 characters"))]
    pub number: String,

    #[validate(length(min = 1, max = 128, message = "Neighborhood must be 1-128 characters"))]
    pub neighborhood: String,

    #[validate(length(min = 1, max = 128, message = "City must be 1-128 characters"))]
    pub city: String,

    pub latitude: f64,
    pub longitude: f64,

    pub waste_type: WasteType,

    #[validate(range(min = 0.01, message = "Quantity must be positive"))]
    pub quantity_value: f64,
    pub quantity_unit: QuantityUnit,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,

    pub priority: Option<Priority>,
    pub scheduled_date: Option<NaiveDate>,
    pub time_window: Option<(NaiveTime, NaiveTime)>,
    pub recurrence: Option<Recurrence>,
}

impl CreatePointDto {
    pub fn quantity(&self) -> Quantity {
        Quantity {
            value: self.quantity_value,
            unit: self.quantity_unit,
        }
    }
}

/// Per-transition payload; which fields matter depends on the target state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    /// Free-text note appended to the history entry.
    pub note: Option<String>,
    /// Completion data; read on the transition to collected.
    pub actual_quantity: Option<Quantity>,
    pub collector_notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub duration_minutes: Option<u32>,
    /// Cancellation reason; required on the transition to cancelled.
    pub reason: Option<String>,
}

/// Feedback attachable after collection
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be 1-5"))]
    pub rating: u8,

    #[validate(length(max = 2000, message = "Comment must not exceed 2000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn valid_dto() -> CreatePointDto {
        CreatePointDto {
            citizen_id: Uuid::new_v4(),
            citizen_name: "Maria Silva".to_string(),
            phone: "+55 11 98765-4321".to_string(),
            email: Some("maria@example.com".to_string()),
            street: "Rua das Flores".to_string(),
            number: "123".to_string(),
            neighborhood: "Centro".to_string(),
            city: "Campinas".to_string(),
            latitude: -22.9099,
            longitude: -47.0626,
            waste_type: WasteType::Leaves,
            quantity_value: 5.0,
            quantity_unit: QuantityUnit::Bags,
            description: None,
            images: vec![],
            priority: None,
            scheduled_date: None,
            time_window: None,
            recurrence: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_dto().validate().is_ok());
    }

    #[test]
    fn bad_phone_fails() {
        let mut dto = valid_dto();
        dto.phone = "not-a-phone".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn bad_email_fails() {
        let mut dto = valid_dto();
        dto.email = Some("not-an-email".to_string());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn zero_quantity_fails() {
        let mut dto = valid_dto();
        dto.quantity_value = 0.0;
        assert!(dto.validate().is_err());
    }
}
