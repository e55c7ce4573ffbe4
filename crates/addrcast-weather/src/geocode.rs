//! Forward geocoding: postal address to a single coordinate.
//!
//! Talks to a Census-style geocoder whose responses look like
//! `{ "result": { "addressMatches": [ { "coordinates": { "x": lon, "y": lat } } ] } }`.
//! Only the first match is used.

use addrcast_core::ForecastError;
use serde_json::Value;

use crate::client::UpstreamClient;
use crate::types::{Address, Coordinate};

pub const SERVICE: &str = "geocode";

#[derive(Debug, Clone)]
pub struct GeocodeAdapter {
    client: UpstreamClient,
    url_template: String,
}

impl GeocodeAdapter {
    /// `url_template` carries `{street}`, `{city}`, `{state}` and `{zipcode}`.
    pub fn new(client: UpstreamClient, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    /// Fill the template with URL-encoded address fields.
    pub fn request_url(&self, address: &Address) -> String {
        self.url_template
            .replace("{street}", &encode(&address.street))
            .replace("{city}", &encode(&address.city))
            .replace("{state}", &encode(&address.state))
            .replace("{zipcode}", &encode(&address.zipcode))
    }

    /// Resolve `address` to its first match, or `None` when the geocoder has no match.
    pub async fn geocode(&self, address: &Address) -> Result<Option<Coordinate>, ForecastError> {
        let url = self.request_url(address);
        let body = self.client.get_text(SERVICE, &url).await?;
        coordinates_from_geocode_json(&body)
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Pull the first match's coordinate out of a geocoder response.
///
/// A missing or null `result.addressMatches`, or an empty one, means no match.
/// Note the upstream convention: `x` is longitude and `y` is latitude.
pub fn coordinates_from_geocode_json(json: &str) -> Result<Option<Coordinate>, ForecastError> {
    let root: Value =
        serde_json::from_str(json).map_err(|e| ForecastError::malformed(SERVICE, e.to_string()))?;

    let matches = match root.get("result").and_then(|result| result.get("addressMatches")) {
        None | Some(Value::Null) => return Ok(None),
        Some(matches) => matches,
    };

    let matches = matches
        .as_array()
        .ok_or_else(|| ForecastError::malformed(SERVICE, "result.addressMatches is not an array"))?;

    let Some(first) = matches.first() else {
        return Ok(None);
    };

    let coordinates = first
        .get("coordinates")
        .ok_or_else(|| ForecastError::malformed(SERVICE, "first match has no coordinates"))?;

    let longitude = number_field(coordinates, "x")?;
    let latitude = number_field(coordinates, "y")?;

    Ok(Some(Coordinate::new(latitude, longitude)))
}

fn number_field(coordinates: &Value, field: &str) -> Result<f64, ForecastError> {
    coordinates.get(field).and_then(Value::as_f64).ok_or_else(|| {
        ForecastError::malformed(SERVICE, format!("coordinates.{} is missing or not a number", field))
    })
}
