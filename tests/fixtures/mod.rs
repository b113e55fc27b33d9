//! Test fixtures for delivery-planner.
//!
//! Provides realistic test data including:
//! - Real Las Vegas / Henderson locations (from OpenStreetMap)
//! - Builders for vehicles and equator-aligned synthetic stops

#![allow(dead_code)]

pub mod las_vegas_locations;

use delivery_planner::geo::EARTH_RADIUS_KM;
use delivery_planner::{Coordinate, DeliveryItem, DeliveryStop, VehicleCandidate, VehicleType};

/// A point on the equator `km` east of (0, 0).
pub fn equator_point(km: f64) -> Coordinate {
    let degrees = (km / EARTH_RADIUS_KM).to_degrees();
    Coordinate::new(0.0, degrees)
}

pub fn stop_at(km: f64, unloading_minutes: u32) -> DeliveryStop {
    DeliveryStop::new(equator_point(km), unloading_minutes)
}

pub fn item(weight: f64, volume: f64, quantity: u32) -> DeliveryItem {
    DeliveryItem {
        weight,
        volume,
        quantity,
    }
}

/// Builder for test vehicles with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestVehicle {
    inner: VehicleCandidate,
}

impl TestVehicle {
    pub fn new(id: &str) -> Self {
        Self {
            inner: VehicleCandidate {
                id: id.to_string(),
                registration: format!("NV-{}", id.to_uppercase()),
                vehicle_type: VehicleType::Van,
                max_weight: 1000.0,
                max_volume: 10.0,
                current_location: None,
            },
        }
    }

    pub fn capacity(mut self, max_weight: f64, max_volume: f64) -> Self {
        self.inner.max_weight = max_weight;
        self.inner.max_volume = max_volume;
        self
    }

    pub fn located_at(mut self, location: Coordinate) -> Self {
        self.inner.current_location = Some(location);
        self
    }

    pub fn kind(mut self, vehicle_type: VehicleType) -> Self {
        self.inner.vehicle_type = vehicle_type;
        self
    }

    pub fn build(self) -> VehicleCandidate {
        self.inner
    }
}
