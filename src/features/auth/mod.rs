pub mod guards;
pub mod model;

pub use model::{Actor, Role};
