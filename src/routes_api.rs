//! Directions adapter for a Routes-API-style HTTP endpoint.
//!
//! Requests are traffic-aware `computeRoutes` calls. Round trips are sent with
//! the origin as destination and the stops as intermediates, asking the
//! provider to optimize the intermediate order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::optimizer::check_permutation;
use crate::traits::{DistanceProvider, EstimateSource, ProviderRoute, TravelEstimate};
use crate::types::{Coordinate, RouteLeg, VehicleType};

pub const COMPUTE_ROUTES_PATH: &str = "/directions/v2:computeRoutes";

const FIELD_MASK: &str = "routes.distanceMeters,routes.duration,routes.staticDuration,\
routes.optimizedIntermediateWaypointIndex,routes.legs.distanceMeters,\
routes.legs.duration,routes.legs.staticDuration";

#[derive(Debug, Clone)]
pub struct RoutesApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Base URL of the geocoding endpoint sharing the same key.
    pub geocoding_url: String,
}

impl Default for RoutesApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://routes.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            geocoding_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
        }
    }
}

impl RoutesApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutesApiClient {
    config: RoutesApiConfig,
    client: reqwest::blocking::Client,
}

impl RoutesApiClient {
    pub fn new(config: RoutesApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn compute_routes(&self, request: &ComputeRoutesRequest) -> Result<ComputeRoutesResponse, ProviderError> {
        let url = format!("{}{}", self.config.base_url, COMPUTE_ROUTES_PATH);

        debug!(
            "Requesting route from {} with {} intermediates",
            url,
            request.intermediates.len()
        );

        // The response body is fully read before returning, so the connection
        // goes back to the pool on every path.
        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl DistanceProvider for RoutesApiClient {
    fn name(&self) -> &str {
        "RoutesApi"
    }

    fn distance_and_duration(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<TravelEstimate, ProviderError> {
        let request = ComputeRoutesRequest::new(origin, destination, &[], VehicleType::Car, false);
        let response = self.compute_routes(&request)?;
        parse_travel_estimate(response)
    }

    fn optimized_round_trip(
        &self,
        origin: &Coordinate,
        stops: &[Coordinate],
        vehicle_type: VehicleType,
    ) -> Result<ProviderRoute, ProviderError> {
        let request = ComputeRoutesRequest::new(origin, origin, stops, vehicle_type, true);
        let response = self.compute_routes(&request)?;
        parse_round_trip(response, origin, stops)
    }
}

fn travel_mode(vehicle_type: VehicleType) -> &'static str {
    match vehicle_type {
        VehicleType::Car | VehicleType::Van | VehicleType::Truck => "DRIVE",
        VehicleType::Motorcycle => "TWO_WHEELER",
        VehicleType::Bicycle => "BICYCLE",
    }
}

// Request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ComputeRoutesRequest {
    origin: ApiWaypoint,
    destination: ApiWaypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    intermediates: Vec<ApiWaypoint>,
    travel_mode: &'static str,
    /// Traffic-aware routing is only accepted for motorized modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_preference: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optimize_waypoint_order: bool,
}

impl ComputeRoutesRequest {
    pub(crate) fn new(
        origin: &Coordinate,
        destination: &Coordinate,
        intermediates: &[Coordinate],
        vehicle_type: VehicleType,
        optimize_waypoint_order: bool,
    ) -> Self {
        let mode = travel_mode(vehicle_type);
        let routing_preference = (mode != "BICYCLE").then_some("TRAFFIC_AWARE");

        Self {
            origin: ApiWaypoint::from(origin),
            destination: ApiWaypoint::from(destination),
            intermediates: intermediates.iter().map(ApiWaypoint::from).collect(),
            travel_mode: mode,
            routing_preference,
            optimize_waypoint_order,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiWaypoint {
    location: ApiLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    lat_lng: ApiLatLng,
}

#[derive(Debug, Serialize)]
struct ApiLatLng {
    latitude: f64,
    longitude: f64,
}

impl From<&Coordinate> for ApiWaypoint {
    fn from(coordinate: &Coordinate) -> Self {
        Self {
            location: ApiLocation {
                lat_lng: ApiLatLng {
                    latitude: coordinate.lat,
                    longitude: coordinate.lng,
                },
            },
        }
    }
}

// Response types

#[derive(Debug, Deserialize)]
pub(crate) struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoute {
    #[serde(default)]
    distance_meters: f64,
    duration: Option<ApiDuration>,
    static_duration: Option<ApiDuration>,
    optimized_intermediate_waypoint_index: Option<Vec<i64>>,
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLeg {
    #[serde(default)]
    distance_meters: f64,
    duration: Option<ApiDuration>,
    static_duration: Option<ApiDuration>,
}

/// Durations arrive as `"123s"`, ISO-8601 `"PT2M3S"` or plain seconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiDuration {
    Seconds(f64),
    Text(String),
}

impl ApiDuration {
    fn minutes(&self) -> Result<f64, ProviderError> {
        let seconds = match self {
            ApiDuration::Seconds(seconds) => *seconds,
            ApiDuration::Text(text) => parse_duration_seconds(text)?,
        };
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ProviderError::Malformed(format!("duration of {} seconds", seconds)));
        }
        Ok(seconds / 60.0)
    }
}

pub(crate) fn parse_duration_seconds(text: &str) -> Result<f64, ProviderError> {
    let malformed = || ProviderError::Malformed(format!("unparseable duration {:?}", text));
    let trimmed = text.trim();

    if let Some(iso) = trimmed.strip_prefix("PT") {
        let mut seconds = 0.0;
        let mut number = String::new();
        for ch in iso.chars() {
            match ch {
                '0'..='9' | '.' => number.push(ch),
                'H' | 'M' | 'S' => {
                    let value: f64 = number.parse().map_err(|_| malformed())?;
                    seconds += match ch {
                        'H' => value * 3600.0,
                        'M' => value * 60.0,
                        _ => value,
                    };
                    number.clear();
                }
                _ => return Err(malformed()),
            }
        }
        if !number.is_empty() {
            return Err(malformed());
        }
        return Ok(seconds);
    }

    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    let seconds: f64 = digits.parse().map_err(|_| malformed())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(malformed());
    }
    Ok(seconds)
}

/// `(duration, traffic duration)` from a traffic-aware duration and its
/// traffic-free counterpart.
fn split_durations(
    duration: Option<&ApiDuration>,
    static_duration: Option<&ApiDuration>,
) -> Result<(f64, Option<f64>), ProviderError> {
    let live = duration
        .map(ApiDuration::minutes)
        .transpose()?
        .ok_or_else(|| ProviderError::Malformed("missing duration".to_string()))?;

    match static_duration.map(ApiDuration::minutes).transpose()? {
        Some(free_flow) => Ok((free_flow, Some(live))),
        None => Ok((live, None)),
    }
}

fn kilometers(meters: f64) -> Result<f64, ProviderError> {
    if !meters.is_finite() || meters < 0.0 {
        return Err(ProviderError::Malformed(format!("distance of {} meters", meters)));
    }
    Ok(meters / 1000.0)
}

fn first_route(response: ComputeRoutesResponse) -> Result<ApiRoute, ProviderError> {
    response.routes.into_iter().next().ok_or(ProviderError::NoRoutes)
}

pub(crate) fn parse_travel_estimate(response: ComputeRoutesResponse) -> Result<TravelEstimate, ProviderError> {
    let route = first_route(response)?;
    let (duration_minutes, route_traffic) =
        split_durations(route.duration.as_ref(), route.static_duration.as_ref())?;

    let traffic_duration_minutes = match (route_traffic, route.legs.first()) {
        (Some(_), Some(leg)) => leg.duration.as_ref().map(ApiDuration::minutes).transpose()?,
        (traffic, _) => traffic,
    };

    Ok(TravelEstimate {
        distance_km: kilometers(route.distance_meters)?,
        duration_minutes,
        traffic_duration_minutes,
        source: EstimateSource::Provider,
    })
}

/// Rebuilds the round trip in the provider's visiting order.
pub(crate) fn parse_round_trip(
    response: ComputeRoutesResponse,
    origin: &Coordinate,
    stops: &[Coordinate],
) -> Result<ProviderRoute, ProviderError> {
    let route = first_route(response)?;
    let n = stops.len();

    let order = match route.optimized_intermediate_waypoint_index {
        Some(indices) => indices
            .into_iter()
            .map(|index| {
                usize::try_from(index)
                    .map_err(|_| ProviderError::Malformed(format!("negative waypoint index {}", index)))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => (0..n).collect(),
    };

    check_permutation(&order, n)?;

    if route.legs.len() != n + 1 {
        return Err(ProviderError::Malformed(format!(
            "expected {} legs, got {}",
            n + 1,
            route.legs.len()
        )));
    }

    let mut points = Vec::with_capacity(n + 2);
    points.push(origin);
    points.extend(order.iter().map(|&index| &stops[index]));
    points.push(origin);

    let legs = route
        .legs
        .iter()
        .zip(points.windows(2))
        .map(|(leg, pair)| {
            let (duration_minutes, traffic_duration_minutes) =
                split_durations(leg.duration.as_ref(), leg.static_duration.as_ref())?;
            Ok(RouteLeg {
                start_location: pair[0].clone(),
                end_location: pair[1].clone(),
                distance_km: kilometers(leg.distance_meters)?,
                duration_minutes,
                traffic_duration_minutes,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(ProviderRoute { order, legs })
}
