//! Haversine distance provider (fallback when no mapping provider is available).
//!
//! Uses great-circle distance to estimate travel time.
//! Less accurate than a road network (ignores roads and live traffic) but
//! always available and deterministic.

use crate::error::ProviderError;
use crate::geo::haversine_km;
use crate::traits::{DistanceProvider, EstimateSource, TravelEstimate};
use crate::types::{Coordinate, RouteLeg};

/// Minutes per kilometer, i.e. an effective urban speed of 30 km/h.
pub const MINUTES_PER_KM: f64 = 2.0;

/// Flat traffic penalty applied to the estimated duration.
pub const TRAFFIC_MULTIPLIER: f64 = 1.2;

/// Haversine-based distance provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineEstimator;

impl HaversineEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Infallible estimate between two points.
    pub fn estimate(&self, origin: &Coordinate, destination: &Coordinate) -> TravelEstimate {
        let distance_km = haversine_km(origin, destination);
        let duration_minutes = distance_km * MINUTES_PER_KM;

        TravelEstimate {
            distance_km,
            duration_minutes,
            traffic_duration_minutes: Some(duration_minutes * TRAFFIC_MULTIPLIER),
            source: EstimateSource::Local,
        }
    }

    /// Estimated leg between two points.
    pub fn leg(&self, start: &Coordinate, end: &Coordinate) -> RouteLeg {
        let estimate = self.estimate(start, end);

        RouteLeg {
            start_location: start.clone(),
            end_location: end.clone(),
            distance_km: estimate.distance_km,
            duration_minutes: estimate.duration_minutes,
            traffic_duration_minutes: estimate.traffic_duration_minutes,
        }
    }
}

impl DistanceProvider for HaversineEstimator {
    fn name(&self) -> &str {
        "Haversine"
    }

    fn distance_and_duration(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<TravelEstimate, ProviderError> {
        Ok(self.estimate(origin, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleType;

    #[test]
    fn test_estimate_constants() {
        let estimator = HaversineEstimator::new();
        let estimate = estimator.estimate(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 1.0));

        assert_eq!(estimate.duration_minutes, estimate.distance_km * 2.0);
        assert_eq!(
            estimate.traffic_duration_minutes,
            Some(estimate.duration_minutes * 1.2)
        );
        assert_eq!(estimate.source, EstimateSource::Local);
        assert!((estimate.duration_minutes - 314.5).abs() < 0.2);
    }

    #[test]
    fn test_estimate_deterministic() {
        let estimator = HaversineEstimator::new();
        let a = Coordinate::new(36.1, -115.1);
        let b = Coordinate::new(36.2, -115.2);

        assert_eq!(estimator.estimate(&a, &b), estimator.estimate(&a, &b));
    }

    #[test]
    fn test_same_point_is_zero() {
        let estimator = HaversineEstimator::new();
        let point = Coordinate::new(36.1, -115.1);
        let leg = estimator.leg(&point, &point);

        assert_eq!(leg.distance_km, 0.0);
        assert_eq!(leg.duration_minutes, 0.0);
        assert_eq!(leg.traffic_duration_minutes, Some(0.0));
    }

    #[test]
    fn test_does_not_optimize_round_trips() {
        let estimator = HaversineEstimator::new();
        let result = estimator.optimized_round_trip(
            &Coordinate::new(0.0, 0.0),
            &[Coordinate::new(0.1, 0.1)],
            VehicleType::Car,
        );

        assert!(matches!(result, Err(ProviderError::Unsupported(_))));
    }
}
