//! delivery-planner core
//!
//! Multi-stop delivery routing: stop ordering, leg timing, delivery
//! schedules, vehicle selection and departure-time recommendations.

pub mod types;
pub mod error;
pub mod geo;
pub mod traits;
pub mod haversine;
pub mod routes_api;
pub mod geocoding;
pub mod optimizer;
pub mod schedule;
pub mod assignment;
pub mod departure;
pub mod config;
pub mod planner;

pub use config::PlannerConfig;
pub use error::{ConfigError, PlannerError, ProviderError};
pub use planner::DeliveryPlanner;
pub use types::*;
