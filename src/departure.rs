//! Recommended departure time for a single leg.
//!
//! Best effort: a provider failure degrades to the Haversine estimate with
//! `Confidence::Low` instead of failing the call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{PlannerError, ProviderError};
use crate::haversine::HaversineEstimator;
use crate::schedule::shift;
use crate::traits::{DistanceProvider, EstimateSource, TravelEstimate};
use crate::types::{Confidence, Coordinate, DepartureRecommendation};

pub const DEFAULT_BUFFER_MINUTES: f64 = 10.0;

pub struct DepartureTimeCalculator {
    provider: Arc<dyn DistanceProvider>,
    estimator: HaversineEstimator,
}

fn confidence(estimate: &TravelEstimate) -> Confidence {
    match (estimate.source, estimate.traffic_duration_minutes) {
        (EstimateSource::Local, _) => Confidence::Low,
        (EstimateSource::Provider, Some(_)) => Confidence::High,
        (EstimateSource::Provider, None) => Confidence::Medium,
    }
}

fn check_estimate(estimate: TravelEstimate) -> Result<TravelEstimate, ProviderError> {
    let invalid = |value: f64| !value.is_finite() || value < 0.0;
    if invalid(estimate.distance_km)
        || invalid(estimate.duration_minutes)
        || estimate.traffic_duration_minutes.is_some_and(invalid)
    {
        return Err(ProviderError::Malformed(format!(
            "estimate out of range: {} km, {} min",
            estimate.distance_km, estimate.duration_minutes
        )));
    }
    Ok(estimate)
}

impl DepartureTimeCalculator {
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self {
            provider,
            estimator: HaversineEstimator::new(),
        }
    }

    pub fn recommend(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        target_arrival: DateTime<Utc>,
        buffer_minutes: f64,
    ) -> Result<DepartureRecommendation, PlannerError> {
        origin.validate()?;
        destination.validate()?;
        if !buffer_minutes.is_finite() || buffer_minutes < 0.0 {
            return Err(PlannerError::InvalidInput(format!(
                "buffer of {} minutes must be a non-negative number",
                buffer_minutes
            )));
        }

        let estimate = self
            .provider
            .distance_and_duration(origin, destination)
            .and_then(check_estimate)
            .unwrap_or_else(|err| {
                warn!(
                    "{} travel estimate failed: {}. Falling back to local estimate.",
                    self.provider.name(),
                    err
                );
                self.estimator.estimate(origin, destination)
            });

        let travel_minutes = estimate.travel_minutes();

        Ok(DepartureRecommendation {
            departure_time: shift(target_arrival, -(travel_minutes + buffer_minutes))?,
            estimated_travel_minutes: travel_minutes,
            buffer_minutes,
            confidence: confidence(&estimate),
        })
    }
}
