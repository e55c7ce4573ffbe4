//! Two-step forecast lookup against a weather.gov-style API.
//!
//! Step one asks the points endpoint which forecast document covers a
//! coordinate (`properties.forecast`); step two fetches that document and
//! hands its body back untouched.

use addrcast_core::ForecastError;
use serde_json::Value;

use crate::client::UpstreamClient;
use crate::types::Coordinate;

pub const POINTS_SERVICE: &str = "points";
pub const FORECAST_SERVICE: &str = "forecast";

/// Payload returned when the points response links no forecast.
pub const EMPTY_FORECAST: &str = "{}";

#[derive(Debug, Clone)]
pub struct ForecastAdapter {
    client: UpstreamClient,
    points_template: String,
}

impl ForecastAdapter {
    /// `points_template` carries `{latitude}` and `{longitude}`.
    pub fn new(client: UpstreamClient, points_template: impl Into<String>) -> Self {
        Self {
            client,
            points_template: points_template.into(),
        }
    }

    pub fn points_url(&self, coordinate: &Coordinate) -> String {
        self.points_template
            .replace("{latitude}", &format_coordinate(coordinate.latitude()))
            .replace("{longitude}", &format_coordinate(coordinate.longitude()))
    }

    /// Fetch the raw forecast document for `coordinate`.
    pub async fn get_forecast(&self, coordinate: &Coordinate) -> Result<String, ForecastError> {
        let points_url = self.points_url(coordinate);
        let points = self.client.get_text(POINTS_SERVICE, &points_url).await?;

        match forecast_url_from_points_json(&points)? {
            Some(forecast_url) => self.client.get_text(FORECAST_SERVICE, &forecast_url).await,
            None => {
                tracing::debug!("No forecast link for {}, returning empty forecast", coordinate);
                Ok(EMPTY_FORECAST.to_string())
            }
        }
    }
}

/// Render a coordinate component with at most three decimals.
///
/// Rounds half-to-even on the exact binary value and drops trailing zeros:
/// `38.771887717945` becomes `38.772`, `38.5` stays `38.5`, `-121.0` becomes `-121`.
pub fn format_coordinate(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Extract `properties.forecast` from a points response; `None` when absent or null.
pub fn forecast_url_from_points_json(json: &str) -> Result<Option<String>, ForecastError> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| ForecastError::malformed(POINTS_SERVICE, e.to_string()))?;

    match root.get("properties").and_then(|properties| properties.get("forecast")) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(url)) => Ok(Some(url.clone())),
        Some(other) => Err(ForecastError::malformed(
            POINTS_SERVICE,
            format!("properties.forecast is not a URL string: {}", other),
        )),
    }
}
