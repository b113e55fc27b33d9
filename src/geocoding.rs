//! Address geocoding adapter.
//!
//! Sits upstream of the planner: it turns free-text addresses into
//! [`Coordinate`]s with the formatted address attached. An unresolvable
//! address is an expected outcome and is returned as `Ok(None)`.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::routes_api::RoutesApiConfig;
use crate::traits::{GeocodedAddress, Geocoder};
use crate::types::Coordinate;

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeocodingClient {
    pub fn new(config: &RoutesApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            url: config.geocoding_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

impl Geocoder for GeocodingClient {
    fn name(&self) -> &str {
        "Geocoding"
    }

    fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, ProviderError> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        debug!("Geocoding {:?}", address);

        let response = self
            .client
            .get(&self.url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed = parse_geocode_response(&body)?;
        if parsed.is_none() {
            warn!("No geocoding result for {:?}", address);
        }
        Ok(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub(crate) fn parse_geocode_response(body: &str) -> Result<Option<GeocodedAddress>, ProviderError> {
    let response: GeocodeResponse = serde_json::from_str(body)?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        other => {
            return Err(ProviderError::Malformed(format!(
                "geocoding status {}: {}",
                other,
                response.error_message.unwrap_or_default()
            )));
        }
    }

    let Some(best) = response.results.into_iter().next() else {
        return Ok(None);
    };

    let coordinate = Coordinate::new(best.geometry.location.lat, best.geometry.location.lng)
        .with_address(best.formatted_address.clone());
    coordinate
        .validate()
        .map_err(|err| ProviderError::Malformed(format!("geocoded {:?}: {}", best.formatted_address, err)))?;

    Ok(Some(GeocodedAddress {
        coordinate,
        formatted_address: best.formatted_address,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_found() {
        let parsed = parse_geocode_response(
            r#"{"status":"OK","results":[
                {"formatted_address":"Václavské nám. 1, 110 00 Praha","geometry":{"location":{"lat":50.0810,"lng":14.4280}}},
                {"formatted_address":"Elsewhere","geometry":{"location":{"lat":1.0,"lng":1.0}}}
            ]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(parsed.formatted_address, "Václavské nám. 1, 110 00 Praha");
        assert_eq!(parsed.coordinate.lat, 50.0810);
        assert_eq!(parsed.coordinate.lng, 14.4280);
        assert_eq!(parsed.coordinate.address.as_deref(), Some("Václavské nám. 1, 110 00 Praha"));
    }

    #[test]
    fn test_parse_not_found() {
        let parsed = parse_geocode_response(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_denied_is_error() {
        let result = parse_geocode_response(
            r#"{"status":"REQUEST_DENIED","results":[],"error_message":"bad key"}"#,
        );
        assert!(matches!(result, Err(ProviderError::Malformed(message)) if message.contains("bad key")));
    }

    #[test]
    fn test_out_of_range_position_is_malformed() {
        let result = parse_geocode_response(
            r#"{"status":"OK","results":[
                {"formatted_address":"Nowhere","geometry":{"location":{"lat":95.0,"lng":14.4}}}
            ]}"#,
        );
        assert!(matches!(result, Err(ProviderError::Malformed(message)) if message.contains("Nowhere")));
    }

    #[test]
    fn test_blank_address_is_not_found() {
        let client = GeocodingClient::new(&RoutesApiConfig::default()).unwrap();
        assert!(client.geocode("   ").unwrap().is_none());
    }
}
