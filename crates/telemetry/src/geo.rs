//! Reverse geocoding of GPS fixes into place names

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves coordinates to a human-readable place.
///
/// Implementations must not fail past this boundary; any problem is `None`.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Resolver that never resolves
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl GeoResolver for NoopResolver {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        None
    }
}

/// Reverse geocoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Enable reverse geocoding
    pub enabled: bool,
    /// Nominatim reverse endpoint
    pub endpoint: String,
    /// User-Agent sent to the service (required by Nominatim usage policy)
    pub user_agent: String,
    /// Preferred response language
    pub language: String,
    /// Request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: "driver_drowsiness_system".to_string(),
            language: "en".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Resolver backed by an OpenStreetMap Nominatim server
pub struct NominatimResolver {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl NominatimResolver {
    pub fn new(config: &GeoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
        })
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<serde_json::Value, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl GeoResolver for NominatimResolver {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Option<String> {
        match self.lookup(latitude, longitude).await {
            Ok(body) => {
                let place = place_from_response(&body);
                if place.is_none() {
                    debug!("No place found for {}, {}", latitude, longitude);
                }
                place
            }
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                None
            }
        }
    }
}

/// Extract the display name from a Nominatim reverse response
pub fn place_from_response(body: &serde_json::Value) -> Option<String> {
    if body.get("error").is_some() {
        return None;
    }
    body.get("display_name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the resolver selected by configuration
pub fn resolver_from_config(config: &GeoConfig) -> Arc<dyn GeoResolver> {
    if !config.enabled {
        info!("Reverse geocoding disabled");
        return Arc::new(NoopResolver);
    }

    match NominatimResolver::new(config) {
        Ok(resolver) => {
            info!("Reverse geocoding via {}", config.endpoint);
            Arc::new(resolver)
        }
        Err(e) => {
            warn!("Failed to build geocoding client, place names disabled: {}", e);
            Arc::new(NoopResolver)
        }
    }
}
