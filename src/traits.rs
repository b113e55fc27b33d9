//! Provider seams.
//!
//! The planner only talks to mapping and geocoding services through these
//! traits. A concrete provider is chosen once when the planner is built.

use crate::error::ProviderError;
use crate::types::{Coordinate, RouteLeg, VehicleType};

/// Where a travel estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateSource {
    /// External mapping provider.
    Provider,
    /// Local Haversine estimator.
    Local,
}

/// Distance and duration between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelEstimate {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub traffic_duration_minutes: Option<f64>,
    pub source: EstimateSource,
}

impl TravelEstimate {
    pub fn travel_minutes(&self) -> f64 {
        self.traffic_duration_minutes.unwrap_or(self.duration_minutes)
    }
}

/// A closed tour as returned by a provider that orders waypoints itself.
///
/// `order` indexes the submitted stops; `legs` runs origin -> stops in
/// `order` -> origin, so it has one more entry than `order`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    pub order: Vec<usize>,
    pub legs: Vec<RouteLeg>,
}

/// Provides distance/duration between points.
pub trait DistanceProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    fn distance_and_duration(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<TravelEstimate, ProviderError>;

    /// Orders `stops` into a round trip from `origin`.
    ///
    /// Providers without waypoint optimization keep the default, which makes
    /// the optimizer use its local ordering.
    fn optimized_round_trip(
        &self,
        _origin: &Coordinate,
        _stops: &[Coordinate],
        _vehicle_type: VehicleType,
    ) -> Result<ProviderRoute, ProviderError> {
        Err(ProviderError::Unsupported("local estimator"))
    }
}

/// A geocoded free-text address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Best-match position, with `address` set to the formatted address.
    pub coordinate: Coordinate,
    pub formatted_address: String,
}

/// Resolves free-text addresses to coordinates.
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the address could not be resolved.
    fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, ProviderError>;
}
