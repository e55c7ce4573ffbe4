//! Forecast resolution: cache lookup, then geocode and forecast on a miss.

use addrcast_core::{AppError, Config, ForecastError, ReqwestErrorExt};

use crate::cache::{CacheKeyStrategy, ResultCache, ZipcodeKey};
use crate::client::UpstreamClient;
use crate::forecast::ForecastAdapter;
use crate::geocode::GeocodeAdapter;
use crate::retry::RetryConfig;
use crate::types::{Address, ForecastOutcome, ForecastResult};

/// Resolves addresses to forecasts, caching successful lookups.
///
/// Shared across concurrent requests; the cache does its own locking.
/// Concurrent misses for the same key each go upstream and the last
/// write wins.
#[derive(Debug)]
pub struct ForecastPipeline {
    geocoder: GeocodeAdapter,
    forecaster: ForecastAdapter,
    cache: ResultCache,
    key_strategy: Box<dyn CacheKeyStrategy>,
}

impl ForecastPipeline {
    /// Build a pipeline keyed by zipcode.
    pub fn new(geocoder: GeocodeAdapter, forecaster: ForecastAdapter, cache: ResultCache) -> Self {
        Self {
            geocoder,
            forecaster,
            cache,
            key_strategy: Box::new(ZipcodeKey),
        }
    }

    /// Replace the zipcode key with another derivation.
    pub fn with_key_strategy(mut self, strategy: impl CacheKeyStrategy + 'static) -> Self {
        self.key_strategy = Box::new(strategy);
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let retry = RetryConfig::from(&config.retry);
        let client = UpstreamClient::from_config(&config.upstream, retry)
            .map_err(|e| AppError::Network(e.into_network_error()))?;

        let geocoder = GeocodeAdapter::new(client.clone(), config.upstream.geocode_url.clone());
        let forecaster = ForecastAdapter::new(client, config.upstream.points_url.clone());
        let cache = ResultCache::from_config(&config.cache)?;

        Ok(Self::new(geocoder, forecaster, cache))
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Resolve one address.
    ///
    /// A cache hit skips both upstream services. An address the geocoder
    /// cannot match yields `ForecastOutcome::NotFound` and is never cached.
    pub async fn resolve(&self, address: &Address) -> Result<ForecastOutcome, ForecastError> {
        let key = self.key_strategy.key(address);

        tracing::debug!("Attempting to get {} from the cache", key);
        if let Some(payload) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {}", key);
            return Ok(ForecastOutcome::Found(ForecastResult {
                payload,
                cached: true,
            }));
        }
        tracing::debug!("Cache miss for {}", key);

        let Some(coordinate) = self.geocoder.geocode(address).await? else {
            tracing::warn!("No coordinates found for address: '{}'", address);
            return Ok(ForecastOutcome::NotFound);
        };
        tracing::debug!("Found coordinates {} for address: '{}'", coordinate, address);

        let payload = self.forecaster.get_forecast(&coordinate).await?;

        tracing::debug!("Adding {} to the cache", key);
        self.cache.put(key, payload.clone());

        Ok(ForecastOutcome::Found(ForecastResult {
            payload,
            cached: false,
        }))
    }
}
