mod route;

pub use route::{Route, RouteStatus};
