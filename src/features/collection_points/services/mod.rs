mod point_service;

pub use point_service::{next_occurrence, PointService};
