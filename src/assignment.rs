//! Vehicle selection by capacity fit and proximity.

use tracing::debug;

use crate::error::PlannerError;
use crate::geo::haversine_km;
use crate::types::{AssignmentResult, Coordinate, DeliveryItem, VehicleCandidate};

/// Score marking a vehicle that cannot carry the load.
pub const INFEASIBLE_SCORE: f64 = -1.0;

const UTILIZATION_WEIGHT: f64 = 0.7;
const LOCATION_WEIGHT: f64 = 0.3;

/// Distance at which the proximity score bottoms out.
const PROXIMITY_RANGE_KM: f64 = 50.0;
const MIN_LOCATION_SCORE: f64 = 0.1;

pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleScore<'a> {
    pub vehicle: &'a VehicleCandidate,
    pub score: f64,
    pub utilization: f64,
    pub reasoning: String,
}

impl VehicleScore<'_> {
    pub fn is_feasible(&self) -> bool {
        self.score >= 0.0
    }
}

/// `(total weight, total volume)` of the items.
pub fn load_totals(items: &[DeliveryItem]) -> (f64, f64) {
    items.iter().fold((0.0, 0.0), |(weight, volume), item| {
        let quantity = f64::from(item.quantity);
        (weight + item.weight * quantity, volume + item.volume * quantity)
    })
}

/// Rewards the 50-90% band and penalizes loads close to capacity.
pub fn utilization_score(utilization: f64) -> f64 {
    if utilization < 0.5 {
        utilization
    } else if utilization < 0.9 {
        0.8 + (utilization - 0.5) * 0.5
    } else {
        1.0 - (utilization - 0.9) * 2.0
    }
}

/// 1 next to the start, decaying linearly to 0.1 at 50 km and beyond.
pub fn location_score(distance_km: f64) -> f64 {
    (1.0 - distance_km / PROXIMITY_RANGE_KM).max(MIN_LOCATION_SCORE)
}

pub fn score_vehicle<'a>(
    vehicle: &'a VehicleCandidate,
    total_weight: f64,
    total_volume: f64,
    start_location: &Coordinate,
) -> VehicleScore<'a> {
    let weight_util = total_weight / vehicle.max_weight;
    let volume_util = total_volume / vehicle.max_volume;
    let utilization = weight_util.max(volume_util);

    if utilization > 1.0 {
        return VehicleScore {
            vehicle,
            score: INFEASIBLE_SCORE,
            utilization,
            reasoning: "Exceeds capacity".to_string(),
        };
    }

    let distance_km = vehicle
        .current_location
        .as_ref()
        .map(|location| haversine_km(location, start_location));
    let proximity = distance_km.map_or(1.0, location_score);
    let score = utilization_score(utilization) * UTILIZATION_WEIGHT + proximity * LOCATION_WEIGHT;

    let location_note = match distance_km {
        Some(km) => format!("{:.1} km from start", km),
        None => "location unknown".to_string(),
    };

    VehicleScore {
        vehicle,
        score,
        utilization,
        reasoning: format!(
            "{}% capacity utilization, {}",
            (utilization * 100.0).round(),
            location_note
        ),
    }
}

fn validate(vehicles: &[VehicleCandidate], items: &[DeliveryItem]) -> Result<(), PlannerError> {
    for vehicle in vehicles {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(vehicle.max_weight) || !positive(vehicle.max_volume) {
            return Err(PlannerError::InvalidInput(format!(
                "vehicle {} must have positive capacities, got {} kg / {} m3",
                vehicle.id, vehicle.max_weight, vehicle.max_volume
            )));
        }
        if let Some(location) = &vehicle.current_location {
            location.validate()?;
        }
    }

    for item in items {
        let non_negative = |value: f64| value.is_finite() && value >= 0.0;
        if !non_negative(item.weight) || !non_negative(item.volume) {
            return Err(PlannerError::InvalidInput(format!(
                "item weight {} and volume {} must be non-negative",
                item.weight, item.volume
            )));
        }
    }

    Ok(())
}

/// Picks the best-scoring vehicle that can carry all items, plus up to three
/// runners-up.
pub fn suggest_assignment(
    items: &[DeliveryItem],
    vehicles: &[VehicleCandidate],
    start_location: &Coordinate,
) -> Result<AssignmentResult, PlannerError> {
    start_location.validate()?;
    validate(vehicles, items)?;

    let (total_weight, total_volume) = load_totals(items);

    let mut scores: Vec<VehicleScore<'_>> = vehicles
        .iter()
        .map(|vehicle| score_vehicle(vehicle, total_weight, total_volume, start_location))
        .filter(VehicleScore::is_feasible)
        .collect();

    // Stable: ties keep the caller's order.
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut ranked = scores.into_iter();
    let best = ranked.next().ok_or_else(|| {
        PlannerError::NoViableVehicle(format!(
            "none of {} vehicles can carry {:.1} kg / {:.2} m3",
            vehicles.len(),
            total_weight,
            total_volume
        ))
    })?;

    debug!(
        "Recommending vehicle {} (score {:.3}, utilization {:.2})",
        best.vehicle.id, best.score, best.utilization
    );

    Ok(AssignmentResult {
        recommended_vehicle: best.vehicle.clone(),
        utilization_percent: (best.utilization * 100.0).round().clamp(0.0, 100.0) as u8,
        alternatives: ranked
            .take(MAX_ALTERNATIVES)
            .map(|score| score.vehicle.clone())
            .collect(),
        reasoning: best.reasoning,
    })
}
