use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request DTO for creating a route by hand (admin assignment)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub collector_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Collector name must be 1-255 characters"))]
    pub collector_name: String,

    pub scheduled_date: NaiveDate,

    #[validate(length(min = 1, message = "A route needs at least one collection point"))]
    pub point_ids: Vec<Uuid>,
}

/// New delivery order for a pending route; must be a permutation of the
/// current member set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRouteDto {
    pub point_ids: Vec<Uuid>,
}
