pub mod assignment;
pub mod auth;
pub mod collection_points;
pub mod collection_routes;
pub mod notifications;
