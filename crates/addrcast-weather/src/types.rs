use serde::Deserialize;
use std::fmt;

/// Geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// US postal address as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    /// Two-letter state code
    pub state: String,
    pub zipcode: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zipcode: zipcode.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zipcode
        )
    }
}

/// A resolved forecast and whether it came from the cache.
///
/// `payload` is the weather service's document, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastResult {
    pub payload: String,
    pub cached: bool,
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastOutcome {
    Found(ForecastResult),
    /// The geocoder answered but had no match for the address.
    NotFound,
}
