//! Address-to-forecast resolution for addrcast.
//!
//! Geocodes a street address, looks up the weather forecast covering the
//! resulting point, and caches forecasts by zipcode.

pub mod cache;
pub mod client;
pub mod forecast;
pub mod format;
pub mod geocode;
pub mod pipeline;
pub mod retry;
pub mod types;

pub use cache::{CacheKeyStrategy, FullAddressKey, ResultCache, ZipcodeKey};
pub use client::UpstreamClient;
pub use forecast::{format_coordinate, ForecastAdapter, EMPTY_FORECAST};
pub use format::{format_result, render_outcome, NOT_FOUND_RESPONSE};
pub use geocode::GeocodeAdapter;
pub use pipeline::ForecastPipeline;
pub use retry::RetryConfig;
pub use types::*;
