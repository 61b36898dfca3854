//! verdecoleta-core
//!
//! Scheduling core of the municipal green-waste collection system: the
//! collection-point lifecycle, route construction and execution, role-based
//! authorization and the batch assignment run. Wire endpoints, token
//! verification and message delivery live outside this crate.

pub mod core;
pub mod features;
pub mod shared;

pub use crate::core::config::{Config, PlannerConfig};
pub use crate::core::error::{AppError, Result};
pub use crate::core::store::{MemoryStore, Store};
