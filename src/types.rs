//! Data model shared by the planner components.
//!
//! Everything here is a transient value computed per request. Nothing is
//! persisted by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// A WGS84 position, optionally carrying the address it was geocoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Rejects NaN/infinite values and positions outside lat/lng bounds.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(PlannerError::InvalidInput(format!(
                "coordinate ({}, {}) is not finite",
                self.lat, self.lng
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(PlannerError::InvalidInput(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(PlannerError::InvalidInput(format!(
                "longitude {} out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }
}

/// A delivery location supplied by the caller for one optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStop {
    pub location: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    pub unloading_time_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl DeliveryStop {
    pub fn new(location: Coordinate, unloading_time_minutes: u32) -> Self {
        Self {
            location,
            time_window: None,
            unloading_time_minutes,
            priority: None,
        }
    }

    pub fn with_time_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.time_window = Some(TimeWindow { start, end });
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Travel mode hint forwarded to the mapping provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    #[default]
    Car,
    Van,
    Truck,
    Motorcycle,
    Bicycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub start_location: Coordinate,
    pub end_location: Coordinate,
    pub distance_km: f64,
    pub duration_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_duration_minutes: Option<f64>,
}

impl RouteLeg {
    /// Duration used for scheduling: traffic-aware when known.
    pub fn travel_minutes(&self) -> f64 {
        self.traffic_duration_minutes.unwrap_or(self.duration_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: Coordinate,
    pub stopover: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unloading_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
}

impl From<&DeliveryStop> for Waypoint {
    fn from(stop: &DeliveryStop) -> Self {
        Self {
            location: stop.location.clone(),
            stopover: true,
            unloading_time_minutes: Some(stop.unloading_time_minutes),
            time_window: stop.time_window,
        }
    }
}

/// Where the ordering and leg metrics of a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Ordered and measured by the external mapping provider.
    Provider,
    /// Ordered locally and measured with the Haversine estimator.
    LocalEstimate,
}

/// Visiting order plus per-leg metrics.
///
/// `waypoints` and `legs` follow `order`. With a return leg,
/// `legs.len() == order.len() + 1`, otherwise the two are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub waypoints: Vec<Waypoint>,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    pub legs: Vec<RouteLeg>,
    pub order: Vec<usize>,
    pub source: RouteSource,
}

impl OptimizedRoute {
    pub fn empty(source: RouteSource) -> Self {
        Self::from_legs(Vec::new(), Vec::new(), Vec::new(), source)
    }

    /// Builds a route, deriving the totals from the legs.
    pub fn from_legs(
        waypoints: Vec<Waypoint>,
        legs: Vec<RouteLeg>,
        order: Vec<usize>,
        source: RouteSource,
    ) -> Self {
        let total_distance_km = legs.iter().map(|leg| leg.distance_km).sum();
        let total_duration_minutes = legs.iter().map(|leg| leg.duration_minutes).sum();

        Self {
            waypoints,
            total_distance_km,
            total_duration_minutes,
            legs,
            order,
            source,
        }
    }

    pub fn has_return_leg(&self) -> bool {
        self.legs.len() > self.order.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTimeSlot {
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub unloading_end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_departure_time: Option<DateTime<Utc>>,
    /// Arrival falls outside the stop's requested time window.
    #[serde(default)]
    pub outside_time_window: bool,
}

/// One line of a delivery: per-unit weight/volume times quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub weight: f64,
    pub volume: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleCandidate {
    pub id: String,
    pub registration: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub max_weight: f64,
    pub max_volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub recommended_vehicle: VehicleCandidate,
    pub utilization_percent: u8,
    pub alternatives: Vec<VehicleCandidate>,
    pub reasoning: String,
}

/// How much external, traffic-aware data informed a time estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureRecommendation {
    pub departure_time: DateTime<Utc>,
    pub estimated_travel_minutes: f64,
    pub buffer_minutes: f64,
    pub confidence: Confidence,
}
