//! The four planner operations behind one facade.
//!
//! The distance provider is chosen once, when the planner is built: a
//! configured mapping provider, or the Haversine estimator when none is
//! configured.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::assignment;
use crate::config::PlannerConfig;
use crate::departure::DepartureTimeCalculator;
use crate::error::{ConfigError, PlannerError, ProviderError};
use crate::geocoding::GeocodingClient;
use crate::haversine::HaversineEstimator;
use crate::optimizer::RouteOptimizer;
use crate::routes_api::{RoutesApiClient, RoutesApiConfig};
use crate::schedule::{self, ScheduleOptions};
use crate::traits::{DistanceProvider, Geocoder};
use crate::types::{
    AssignmentResult, Coordinate, DeliveryItem, DeliveryStop, DeliveryTimeSlot, DepartureRecommendation,
    OptimizedRoute, VehicleCandidate, VehicleType,
};

/// Create the distance provider for the given mapping configuration.
pub fn create_distance_provider(
    config: Option<RoutesApiConfig>,
) -> Result<Arc<dyn DistanceProvider>, ConfigError> {
    match config {
        Some(cfg) => {
            info!("Using mapping provider at {}", cfg.base_url);
            Ok(Arc::new(RoutesApiClient::new(cfg)?))
        }
        None => {
            info!("No mapping provider configured, using Haversine estimates");
            Ok(Arc::new(HaversineEstimator::new()))
        }
    }
}

pub struct DeliveryPlanner {
    provider: Arc<dyn DistanceProvider>,
    geocoder: Option<Arc<dyn Geocoder>>,
    optimizer: RouteOptimizer,
    departure: DepartureTimeCalculator,
    schedule: ScheduleOptions,
    departure_buffer_minutes: f64,
}

impl DeliveryPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        let provider = create_distance_provider(config.routes_api.clone())?;
        let geocoder: Option<Arc<dyn Geocoder>> = match &config.routes_api {
            Some(cfg) => Some(Arc::new(GeocodingClient::new(cfg)?)),
            None => None,
        };
        Ok(Self {
            geocoder,
            ..Self::with_provider(provider, config)
        })
    }

    pub fn with_provider(provider: Arc<dyn DistanceProvider>, config: PlannerConfig) -> Self {
        Self {
            optimizer: RouteOptimizer::new(Arc::clone(&provider), config.optimize),
            departure: DepartureTimeCalculator::new(Arc::clone(&provider)),
            provider,
            geocoder: None,
            schedule: config.schedule,
            departure_buffer_minutes: config.departure_buffer_minutes,
        }
    }

    /// Planner with default settings and no mapping provider.
    pub fn local() -> Self {
        Self::with_provider(Arc::new(HaversineEstimator::new()), PlannerConfig::default())
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Replace the geocoder, e.g. with a cached or test implementation.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Resolve a free-text address to a coordinate carrying the formatted
    /// address. Fails with `Unsupported` when no geocoder is configured.
    pub fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or(ProviderError::Unsupported("planner without geocoder"))?;
        Ok(geocoder.geocode(address)?.map(|found| found.coordinate))
    }

    pub fn optimize_route(
        &self,
        origin: &Coordinate,
        stops: &[DeliveryStop],
        vehicle_type: VehicleType,
    ) -> Result<OptimizedRoute, PlannerError> {
        self.optimizer.optimize(origin, stops, vehicle_type)
    }

    /// `buffer_minutes` overrides the configured buffer (15 by default).
    pub fn build_delivery_schedule(
        &self,
        route: &OptimizedRoute,
        start_time: DateTime<Utc>,
        buffer_minutes: Option<f64>,
    ) -> Result<Vec<DeliveryTimeSlot>, PlannerError> {
        let options = ScheduleOptions {
            buffer_minutes: buffer_minutes.unwrap_or(self.schedule.buffer_minutes),
            ..self.schedule.clone()
        };
        schedule::build_schedule(route, start_time, &options)
    }

    pub fn suggest_vehicle_assignment(
        &self,
        items: &[DeliveryItem],
        vehicles: &[VehicleCandidate],
        start_location: &Coordinate,
    ) -> Result<AssignmentResult, PlannerError> {
        assignment::suggest_assignment(items, vehicles, start_location)
    }

    /// `buffer_minutes` overrides the configured buffer (10 by default).
    pub fn recommend_departure_time(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        target_arrival: DateTime<Utc>,
        buffer_minutes: Option<f64>,
    ) -> Result<DepartureRecommendation, PlannerError> {
        self.departure.recommend(
            origin,
            destination,
            target_arrival,
            buffer_minutes.unwrap_or(self.departure_buffer_minutes),
        )
    }
}
