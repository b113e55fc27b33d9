//! Sequential delivery schedule for an optimized route.
//!
//! Walks the legs in order with a running clock: travel, unload, wait the
//! buffer, depart again. Single vehicle, no re-ordering and no capacity
//! checks. Time windows are reported, never enforced.

use chrono::{DateTime, Duration, Utc};

use crate::error::PlannerError;
use crate::types::{DeliveryTimeSlot, OptimizedRoute};

pub const DEFAULT_BUFFER_MINUTES: f64 = 15.0;

/// Unloading time for legs whose waypoint carries none.
pub const DEFAULT_UNLOADING_MINUTES: u32 = 30;

#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    /// Pause between the end of unloading and the next departure.
    pub buffer_minutes: f64,
    pub default_unloading_minutes: u32,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            default_unloading_minutes: DEFAULT_UNLOADING_MINUTES,
        }
    }
}

/// `value` minutes as a duration, `None` when it does not fit.
pub(crate) fn minutes(value: f64) -> Option<Duration> {
    let millis = (value * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// `time` moved by `offset` minutes, failing instead of overflowing.
pub(crate) fn shift(time: DateTime<Utc>, offset: f64) -> Result<DateTime<Utc>, PlannerError> {
    minutes(offset)
        .and_then(|delta| time.checked_add_signed(delta))
        .ok_or_else(|| {
            PlannerError::InvalidInput(format!(
                "{} minutes from {} is outside the representable time range",
                offset, time
            ))
        })
}

/// One slot per leg, in leg order.
///
/// A return leg has no waypoint of its own and so gets the default
/// unloading time.
pub fn build_schedule(
    route: &OptimizedRoute,
    start_time: DateTime<Utc>,
    options: &ScheduleOptions,
) -> Result<Vec<DeliveryTimeSlot>, PlannerError> {
    if !options.buffer_minutes.is_finite() || options.buffer_minutes < 0.0 {
        return Err(PlannerError::InvalidInput(format!(
            "buffer of {} minutes must be a non-negative number",
            options.buffer_minutes
        )));
    }

    let mut slots = Vec::with_capacity(route.legs.len());
    let mut clock = start_time;

    for (i, leg) in route.legs.iter().enumerate() {
        let travel_minutes = leg.travel_minutes();
        if !travel_minutes.is_finite() || travel_minutes < 0.0 {
            return Err(PlannerError::InvalidInput(format!(
                "leg {} has invalid travel time {}",
                i, travel_minutes
            )));
        }

        let waypoint = route.waypoints.get(i);
        let arrival_time = shift(clock, travel_minutes)?;
        let unloading_minutes = waypoint
            .and_then(|waypoint| waypoint.unloading_time_minutes)
            .unwrap_or(options.default_unloading_minutes);
        let unloading_end_time = shift(arrival_time, f64::from(unloading_minutes))?;

        let is_last = i + 1 == route.legs.len();
        let next_departure_time = if is_last {
            None
        } else {
            Some(shift(unloading_end_time, options.buffer_minutes)?)
        };

        let outside_time_window = waypoint
            .and_then(|waypoint| waypoint.time_window)
            .is_some_and(|window| !window.contains(arrival_time));

        slots.push(DeliveryTimeSlot {
            departure_time: clock,
            arrival_time,
            unloading_end_time,
            next_departure_time,
            outside_time_window,
        });

        if let Some(next) = next_departure_time {
            clock = next;
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::types::{Coordinate, RouteLeg, RouteSource, TimeWindow, Waypoint};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 8, 0, 0).unwrap()
    }

    fn leg(duration: f64, traffic: Option<f64>) -> RouteLeg {
        RouteLeg {
            start_location: Coordinate::new(0.0, 0.0),
            end_location: Coordinate::new(0.0, 0.0),
            distance_km: duration / 2.0,
            duration_minutes: duration,
            traffic_duration_minutes: traffic,
        }
    }

    fn waypoint(unloading: Option<u32>) -> Waypoint {
        Waypoint {
            location: Coordinate::new(0.0, 0.0),
            stopover: true,
            unloading_time_minutes: unloading,
            time_window: None,
        }
    }

    fn route(legs: Vec<RouteLeg>, waypoints: Vec<Waypoint>) -> OptimizedRoute {
        let order = (0..waypoints.len()).collect();
        OptimizedRoute::from_legs(waypoints, legs, order, RouteSource::LocalEstimate)
    }

    #[test]
    fn test_two_leg_schedule() {
        let route = route(
            vec![leg(20.0, None), leg(10.0, None)],
            vec![waypoint(Some(30)), waypoint(Some(30))],
        );
        let t = start();
        let slots = build_schedule(&route, t, &ScheduleOptions::default()).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].departure_time, t);
        assert_eq!(slots[0].arrival_time, t + Duration::minutes(20));
        assert_eq!(slots[0].unloading_end_time, t + Duration::minutes(50));
        assert_eq!(slots[0].next_departure_time, Some(t + Duration::minutes(65)));
        assert_eq!(slots[1].departure_time, t + Duration::minutes(65));
        assert_eq!(slots[1].arrival_time, t + Duration::minutes(75));
        assert_eq!(slots[1].unloading_end_time, t + Duration::minutes(105));
        assert_eq!(slots[1].next_departure_time, None);
    }

    #[test]
    fn test_traffic_duration_preferred() {
        let route = route(vec![leg(20.0, Some(24.0))], vec![waypoint(Some(10))]);
        let slots = build_schedule(&route, start(), &ScheduleOptions::default()).unwrap();

        assert_eq!(slots[0].arrival_time, start() + Duration::minutes(24));
    }

    #[test]
    fn test_missing_unloading_uses_default() {
        let route = route(vec![leg(10.0, None), leg(5.0, None)], vec![waypoint(None)]);
        let slots = build_schedule(&route, start(), &ScheduleOptions::default()).unwrap();

        assert_eq!(slots[0].unloading_end_time, start() + Duration::minutes(40));
        // Return leg: no waypoint at all.
        assert_eq!(
            slots[1].unloading_end_time - slots[1].arrival_time,
            Duration::minutes(30)
        );
    }

    #[test]
    fn test_empty_route() {
        let empty = OptimizedRoute::empty(RouteSource::LocalEstimate);
        let slots = build_schedule(&empty, start(), &ScheduleOptions::default()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_fractional_minutes() {
        let route = route(vec![leg(1.5, None)], vec![waypoint(Some(0))]);
        let slots = build_schedule(&route, start(), &ScheduleOptions::default()).unwrap();

        assert_eq!(slots[0].arrival_time, start() + Duration::seconds(90));
    }

    #[test]
    fn test_huge_buffer_is_invalid_input() {
        let route = route(vec![leg(1.0, None), leg(1.0, None)], vec![waypoint(Some(0)), waypoint(Some(0))]);
        for buffer in [1e15, 1e300] {
            let options = ScheduleOptions {
                buffer_minutes: buffer,
                ..Default::default()
            };
            let result = build_schedule(&route, start(), &options);
            assert!(matches!(result, Err(PlannerError::InvalidInput(_))), "buffer {}", buffer);
        }
    }

    #[test]
    fn test_huge_travel_time_is_invalid_input() {
        let route = route(vec![leg(1e16, None)], vec![waypoint(Some(0))]);
        let result = build_schedule(&route, start(), &ScheduleOptions::default());

        assert!(matches!(result, Err(PlannerError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_buffer_rejected() {
        let route = route(vec![leg(1.0, None)], vec![waypoint(Some(0))]);
        let options = ScheduleOptions {
            buffer_minutes: -5.0,
            ..Default::default()
        };

        assert!(matches!(
            build_schedule(&route, start(), &options),
            Err(PlannerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_time_window_flag() {
        let mut on_time = waypoint(Some(10));
        on_time.time_window = Some(TimeWindow {
            start: start(),
            end: start() + Duration::minutes(30),
        });
        let mut late = waypoint(Some(10));
        late.time_window = Some(TimeWindow {
            start: start(),
            end: start() + Duration::minutes(30),
        });

        let route = route(vec![leg(20.0, None), leg(20.0, None)], vec![on_time, late]);
        let slots = build_schedule(&route, start(), &ScheduleOptions::default()).unwrap();

        assert!(!slots[0].outside_time_window);
        assert!(slots[1].outside_time_window);
    }
}
