//! Stop ordering and leg assembly.
//!
//! With an external provider the provider orders the stops. Otherwise, or
//! when the provider fails, stops are ordered locally and legs are measured
//! with the Haversine estimator. The default local ordering sorts stops by
//! straight-line distance from the origin. It ignores inter-stop distances
//! and is not a tour optimization; `LocalOrdering::NearestNeighborTwoOpt`
//! is the opt-in alternative that builds an actual tour.

use std::iter;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlannerError, ProviderError};
use crate::geo::haversine_km;
use crate::haversine::HaversineEstimator;
use crate::traits::{DistanceProvider, ProviderRoute};
use crate::types::{Coordinate, DeliveryStop, OptimizedRoute, RouteLeg, RouteSource, VehicleType, Waypoint};

/// Stop ordering used when no provider ordering is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalOrdering {
    /// Ascending straight-line distance from the origin.
    #[default]
    NearestFromOrigin,
    /// Nearest neighbor from the current position, then 2-opt.
    NearestNeighborTwoOpt,
}

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Append a leg from the last stop back to the origin.
    pub return_to_origin: bool,
    pub ordering: LocalOrdering,
    /// Maximum improvement passes for the 2-opt ordering.
    pub local_search_iterations: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            return_to_origin: false,
            ordering: LocalOrdering::NearestFromOrigin,
            local_search_iterations: 100,
        }
    }
}

pub struct RouteOptimizer {
    provider: Arc<dyn DistanceProvider>,
    estimator: HaversineEstimator,
    options: OptimizeOptions,
}

impl RouteOptimizer {
    pub fn new(provider: Arc<dyn DistanceProvider>, options: OptimizeOptions) -> Self {
        Self {
            provider,
            estimator: HaversineEstimator::new(),
            options,
        }
    }

    /// Optimizer without an external provider.
    pub fn local(options: OptimizeOptions) -> Self {
        Self::new(Arc::new(HaversineEstimator::new()), options)
    }

    pub fn optimize(
        &self,
        origin: &Coordinate,
        stops: &[DeliveryStop],
        vehicle_type: VehicleType,
    ) -> Result<OptimizedRoute, PlannerError> {
        origin.validate()?;
        if stops.is_empty() {
            return Err(PlannerError::InvalidInput(
                "at least one delivery stop is required".to_string(),
            ));
        }
        for (index, stop) in stops.iter().enumerate() {
            stop.location.validate().map_err(|err| {
                PlannerError::InvalidInput(format!("stop {}: {}", index, err))
            })?;
        }

        let locations: Vec<Coordinate> = stops.iter().map(|stop| stop.location.clone()).collect();

        match self
            .provider
            .optimized_round_trip(origin, &locations, vehicle_type)
            .and_then(|route| check_provider_route(route, stops.len()))
        {
            Ok(route) => {
                debug!(
                    "{} ordered {} stops as {:?}",
                    self.provider.name(),
                    stops.len(),
                    route.order
                );
                return Ok(self.provider_route(stops, route));
            }
            Err(ProviderError::Unsupported(_)) => {
                debug!("{} cannot order stops, using local ordering", self.provider.name());
            }
            Err(err) => {
                warn!(
                    "{} route optimization failed: {}. Falling back to local estimate.",
                    self.provider.name(),
                    err
                );
            }
        }

        Ok(self.local_route(origin, stops))
    }

    fn provider_route(&self, stops: &[DeliveryStop], route: ProviderRoute) -> OptimizedRoute {
        let ProviderRoute { order, mut legs } = route;
        if !self.options.return_to_origin {
            legs.pop();
        }
        let waypoints = order.iter().map(|&index| Waypoint::from(&stops[index])).collect();

        OptimizedRoute::from_legs(waypoints, legs, order, RouteSource::Provider)
    }

    fn local_route(&self, origin: &Coordinate, stops: &[DeliveryStop]) -> OptimizedRoute {
        let locations: Vec<&Coordinate> = stops.iter().map(|stop| &stop.location).collect();

        let order = match self.options.ordering {
            LocalOrdering::NearestFromOrigin => nearest_from_origin_order(origin, &locations),
            LocalOrdering::NearestNeighborTwoOpt => {
                let mut order = nearest_neighbor_order(origin, &locations);
                two_opt_improve(
                    &mut order,
                    origin,
                    &locations,
                    self.options.return_to_origin,
                    self.options.local_search_iterations,
                );
                order
            }
        };

        let mut points: Vec<&Coordinate> = iter::once(origin)
            .chain(order.iter().map(|&index| locations[index]))
            .collect();
        if self.options.return_to_origin {
            points.push(origin);
        }

        // Indexed parallel collect keeps legs in visiting order.
        let legs: Vec<RouteLeg> = points
            .par_windows(2)
            .map(|pair| self.estimator.leg(pair[0], pair[1]))
            .collect();

        let waypoints = order.iter().map(|&index| Waypoint::from(&stops[index])).collect();

        OptimizedRoute::from_legs(waypoints, legs, order, RouteSource::LocalEstimate)
    }
}

/// Fails unless `order` visits each of `stop_count` stops exactly once.
pub(crate) fn check_permutation(order: &[usize], stop_count: usize) -> Result<(), ProviderError> {
    let mut seen = vec![false; stop_count];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(ProviderError::Malformed(format!(
                    "waypoint order {:?} is not a permutation of {} stops",
                    order, stop_count
                )));
            }
        }
    }
    if order.len() != stop_count {
        return Err(ProviderError::Malformed(format!(
            "waypoint order has {} entries for {} stops",
            order.len(),
            stop_count
        )));
    }
    Ok(())
}

/// Provider routes are closed tours: one leg per stop plus the return leg.
fn check_provider_route(route: ProviderRoute, stop_count: usize) -> Result<ProviderRoute, ProviderError> {
    check_permutation(&route.order, stop_count)?;
    if route.legs.len() != stop_count + 1 {
        return Err(ProviderError::Malformed(format!(
            "expected {} legs, got {}",
            stop_count + 1,
            route.legs.len()
        )));
    }

    let invalid = |value: f64| !value.is_finite() || value < 0.0;

    for leg in &route.legs {
        if invalid(leg.distance_km)
            || invalid(leg.duration_minutes)
            || leg.traffic_duration_minutes.is_some_and(invalid)
        {
            return Err(ProviderError::Malformed(format!(
                "leg metrics out of range: {} km, {} min",
                leg.distance_km, leg.duration_minutes
            )));
        }
    }

    Ok(route)
}

/// Stop indices sorted by straight-line distance from `origin`.
pub fn nearest_from_origin_order(origin: &Coordinate, locations: &[&Coordinate]) -> Vec<usize> {
    let mut keyed: Vec<(usize, f64)> = locations
        .iter()
        .enumerate()
        .map(|(index, location)| (index, haversine_km(origin, location)))
        .collect();

    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
    keyed.into_iter().map(|(index, _)| index).collect()
}

/// Greedy tour: always visit the closest unvisited stop next.
pub fn nearest_neighbor_order(origin: &Coordinate, locations: &[&Coordinate]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..locations.len()).collect();
    let mut order = Vec::with_capacity(locations.len());
    let mut current = origin;

    while !remaining.is_empty() {
        let (position, _) = remaining
            .iter()
            .enumerate()
            .map(|(position, &index)| (position, haversine_km(current, locations[index])))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));

        let next = remaining.remove(position);
        order.push(next);
        current = locations[next];
    }

    order
}

fn tour_length(order: &[usize], origin: &Coordinate, locations: &[&Coordinate], closed: bool) -> f64 {
    let mut total = 0.0;
    let mut previous = origin;
    for &index in order {
        total += haversine_km(previous, locations[index]);
        previous = locations[index];
    }
    if closed {
        total += haversine_km(previous, origin);
    }
    total
}

/// 2-opt: reverse segments of the visiting order while that shortens the tour.
fn two_opt_improve(
    order: &mut [usize],
    origin: &Coordinate,
    locations: &[&Coordinate],
    closed: bool,
    max_iterations: usize,
) {
    let n = order.len();
    if n < 2 {
        return;
    }

    let mut current = tour_length(order, origin, locations, closed);

    for _ in 0..max_iterations {
        let mut improved = false;

        for i in 0..n - 1 {
            for j in i + 1..n {
                order[i..=j].reverse();
                let candidate = tour_length(order, origin, locations, closed);
                if candidate + 1e-9 < current {
                    current = candidate;
                    improved = true;
                } else {
                    order[i..=j].reverse();
                }
            }
        }

        if !improved {
            break;
        }
    }
}
