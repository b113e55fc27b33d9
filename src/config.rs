//! Configuration management

use crate::departure;
use crate::error::ConfigError;
use crate::optimizer::{LocalOrdering, OptimizeOptions};
use crate::routes_api::RoutesApiConfig;
use crate::schedule::ScheduleOptions;

/// Planner configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Mapping provider settings. `None` selects the local estimator.
    pub routes_api: Option<RoutesApiConfig>,
    pub optimize: OptimizeOptions,
    pub schedule: ScheduleOptions,
    pub departure_buffer_minutes: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            routes_api: None,
            optimize: OptimizeOptions::default(),
            schedule: ScheduleOptions::default(),
            departure_buffer_minutes: departure::DEFAULT_BUFFER_MINUTES,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(api_key) = get("ROUTES_API_KEY") {
            let mut routes_api = RoutesApiConfig::new(api_key);
            if let Some(url) = get("ROUTES_API_URL") {
                routes_api.base_url = url.trim_end_matches('/').to_string();
            }
            if let Some(url) = get("GEOCODING_API_URL") {
                routes_api.geocoding_url = url;
            }
            if let Some(value) = get("ROUTES_API_TIMEOUT_SECS") {
                routes_api.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    key: "ROUTES_API_TIMEOUT_SECS",
                    value,
                })?;
            }
            config.routes_api = Some(routes_api);
        }

        if let Some(value) = get("PLANNER_SCHEDULE_BUFFER_MINUTES") {
            config.schedule.buffer_minutes = parse_minutes("PLANNER_SCHEDULE_BUFFER_MINUTES", value)?;
        }
        if let Some(value) = get("PLANNER_DEFAULT_UNLOADING_MINUTES") {
            config.schedule.default_unloading_minutes =
                value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                    key: "PLANNER_DEFAULT_UNLOADING_MINUTES",
                    value,
                })?;
        }
        if let Some(value) = get("PLANNER_DEPARTURE_BUFFER_MINUTES") {
            config.departure_buffer_minutes = parse_minutes("PLANNER_DEPARTURE_BUFFER_MINUTES", value)?;
        }
        if let Some(value) = get("PLANNER_RETURN_TO_ORIGIN") {
            config.optimize.return_to_origin = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        key: "PLANNER_RETURN_TO_ORIGIN",
                        value,
                    });
                }
            };
        }
        if let Some(value) = get("PLANNER_LOCAL_ORDERING") {
            config.optimize.ordering = match value.trim() {
                "nearest_from_origin" => LocalOrdering::NearestFromOrigin,
                "nearest_neighbor_two_opt" => LocalOrdering::NearestNeighborTwoOpt,
                _ => return Err(ConfigError::UnknownOrdering(value)),
            };
        }

        Ok(config)
    }
}

fn parse_minutes(key: &'static str, value: String) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(minutes) if minutes.is_finite() && minutes >= 0.0 => Ok(minutes),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_api_key() {
        let config = PlannerConfig::from_lookup(lookup(&[])).unwrap();

        assert!(config.routes_api.is_none());
        assert_eq!(config.schedule.buffer_minutes, 15.0);
        assert_eq!(config.schedule.default_unloading_minutes, 30);
        assert_eq!(config.departure_buffer_minutes, 10.0);
        assert!(!config.optimize.return_to_origin);
        assert_eq!(config.optimize.ordering, LocalOrdering::NearestFromOrigin);
    }

    #[test]
    fn test_blank_api_key_means_local() {
        let config = PlannerConfig::from_lookup(lookup(&[("ROUTES_API_KEY", "  ")])).unwrap();
        assert!(config.routes_api.is_none());
    }

    #[test]
    fn test_full_configuration() {
        let config = PlannerConfig::from_lookup(lookup(&[
            ("ROUTES_API_KEY", "secret"),
            ("ROUTES_API_URL", "http://localhost:8080/"),
            ("ROUTES_API_TIMEOUT_SECS", "3"),
            ("PLANNER_SCHEDULE_BUFFER_MINUTES", "5"),
            ("PLANNER_DEPARTURE_BUFFER_MINUTES", "7.5"),
            ("PLANNER_DEFAULT_UNLOADING_MINUTES", "20"),
            ("PLANNER_RETURN_TO_ORIGIN", "yes"),
            ("PLANNER_LOCAL_ORDERING", "nearest_neighbor_two_opt"),
        ]))
        .unwrap();

        let routes_api = config.routes_api.unwrap();
        assert_eq!(routes_api.api_key, "secret");
        assert_eq!(routes_api.base_url, "http://localhost:8080");
        assert_eq!(routes_api.timeout_secs, 3);
        assert_eq!(config.schedule.buffer_minutes, 5.0);
        assert_eq!(config.schedule.default_unloading_minutes, 20);
        assert_eq!(config.departure_buffer_minutes, 7.5);
        assert!(config.optimize.return_to_origin);
        assert_eq!(config.optimize.ordering, LocalOrdering::NearestNeighborTwoOpt);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            PlannerConfig::from_lookup(lookup(&[("PLANNER_SCHEDULE_BUFFER_MINUTES", "-1")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            PlannerConfig::from_lookup(lookup(&[("ROUTES_API_KEY", "k"), ("ROUTES_API_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            PlannerConfig::from_lookup(lookup(&[("PLANNER_RETURN_TO_ORIGIN", "maybe")])),
            Err(ConfigError::InvalidFlag { .. })
        ));
        assert!(matches!(
            PlannerConfig::from_lookup(lookup(&[("PLANNER_LOCAL_ORDERING", "random")])),
            Err(ConfigError::UnknownOrdering(_))
        ));
    }
}
