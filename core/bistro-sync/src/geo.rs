//! Best-effort user location.
//!
//! [`Geolocator::locate`] tries the device position (reverse-geocoded to a
//! place name), then an IP-based lookup, and finally settles on
//! [`Location::unknown`]. Every step is bounded by the configured timeout,
//! and the call itself never fails.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Upper bound for each step (position, reverse geocode, IP lookup).
    pub timeout_secs: u64,
    /// Reverse geocoding endpoint (Nominatim-compatible).
    pub reverse_geocode_url: String,
    /// IP geolocation endpoint (ipapi-compatible JSON).
    pub ip_lookup_url: String,
    pub user_agent: String,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            reverse_geocode_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            ip_lookup_url: "https://ipapi.co/json/".to_string(),
            user_agent: "bistro".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// How a location was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    IpLookup,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinates: Option<Coordinates>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub source: LocationSource,
}

impl Location {
    /// The fallback when nothing could be determined.
    pub fn unknown() -> Self {
        Self {
            coordinates: None,
            city: None,
            region: None,
            country: None,
            source: LocationSource::Unknown,
        }
    }

    /// A device position without a place name.
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            source: LocationSource::Device,
            ..Self::unknown()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source == LocationSource::Unknown
    }

    /// Short human-readable label, e.g. `"Lisbon, Portugal"`.
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [&self.city, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        match (parts.is_empty(), self.coordinates) {
            (false, _) => parts.join(", "),
            (true, Some(c)) => format!("{:.4}, {:.4}", c.latitude, c.longitude),
            (true, None) => "Unknown location".to_string(),
        }
    }
}

/// Device positioning (GPS, OS location service).
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> SyncResult<Coordinates>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> SyncResult<Location>;
}

#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate_ip(&self) -> SyncResult<Location>;
}

/// Composes positioning, reverse geocoding and IP lookup.
pub struct Geolocator {
    position: Option<Arc<dyn PositionSource>>,
    reverse: Arc<dyn ReverseGeocoder>,
    ip: Arc<dyn IpLocator>,
    timeout: Duration,
}

impl Geolocator {
    /// `position` is `None` on platforms without device positioning.
    pub fn new(
        config: &GeoConfig,
        position: Option<Arc<dyn PositionSource>>,
        reverse: Arc<dyn ReverseGeocoder>,
        ip: Arc<dyn IpLocator>,
    ) -> Self {
        Self {
            position,
            reverse,
            ip,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// HTTP reverse geocoding and IP lookup per `config`.
    pub fn with_http(
        config: &GeoConfig,
        position: Option<Arc<dyn PositionSource>>,
    ) -> SyncResult<Self> {
        Ok(Self::new(
            config,
            position,
            Arc::new(HttpReverseGeocoder::new(config)?),
            Arc::new(HttpIpLocator::new(config)?),
        ))
    }

    pub async fn locate(&self) -> Location {
        match self.device_location().await {
            Ok(location) => return location,
            Err(e) => warn!("Device location unavailable, falling back to IP lookup: {}", e),
        }
        match bounded(self.timeout, self.ip.locate_ip()).await {
            Ok(location) => {
                info!("Located via IP lookup: {}", location.label());
                location
            }
            Err(e) => {
                warn!("IP lookup failed, location unknown: {}", e);
                Location::unknown()
            }
        }
    }

    async fn device_location(&self) -> SyncResult<Location> {
        let source = self
            .position
            .as_ref()
            .ok_or_else(|| SyncError::Geolocation("no position source".into()))?;
        let coordinates = bounded(self.timeout, source.current_position()).await?;
        match bounded(self.timeout, self.reverse.reverse(coordinates)).await {
            Ok(location) => Ok(location),
            Err(e) => {
                debug!("Reverse geocoding failed, keeping raw position: {}", e);
                Ok(Location::at(coordinates))
            }
        }
    }
}

async fn bounded<T>(
    limit: Duration,
    step: impl Future<Output = SyncResult<T>>,
) -> SyncResult<T> {
    tokio::time::timeout(limit, step)
        .await
        .map_err(|_| SyncError::Timeout)?
}

fn http_client(config: &GeoConfig) -> SyncResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| SyncError::Geolocation(format!("failed to build HTTP client: {e}")))
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Nominatim-style reverse geocoding over HTTP.
pub struct HttpReverseGeocoder {
    client: Client,
    url: String,
}

impl HttpReverseGeocoder {
    pub fn new(config: &GeoConfig) -> SyncResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.reverse_geocode_url.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for HttpReverseGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> SyncResult<Location> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SyncError::Geolocation(format!("reverse geocode failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SyncError::Geolocation(format!(
                "reverse geocode returned {}",
                response.status()
            )));
        }
        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Geolocation(format!("invalid reverse geocode body: {e}")))?;
        let address = body.address;
        Ok(Location {
            coordinates: Some(coordinates),
            city: address.city.or(address.town).or(address.village),
            region: address.state,
            country: address.country,
            source: LocationSource::Device,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// ipapi-style IP geolocation over HTTP.
pub struct HttpIpLocator {
    client: Client,
    url: String,
}

impl HttpIpLocator {
    pub fn new(config: &GeoConfig) -> SyncResult<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.ip_lookup_url.clone(),
        })
    }
}

#[async_trait]
impl IpLocator for HttpIpLocator {
    async fn locate_ip(&self) -> SyncResult<Location> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SyncError::Geolocation(format!("IP lookup failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SyncError::Geolocation(format!(
                "IP lookup returned {}",
                response.status()
            )));
        }
        let body: IpResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Geolocation(format!("invalid IP lookup body: {e}")))?;
        if body.error {
            return Err(SyncError::Geolocation(
                body.reason.unwrap_or_else(|| "IP lookup rejected".into()),
            ));
        }
        let coordinates = body.latitude.zip(body.longitude).map(|(latitude, longitude)| {
            Coordinates {
                latitude,
                longitude,
            }
        });
        Ok(Location {
            coordinates,
            city: body.city,
            region: body.region,
            country: body.country_name,
            source: LocationSource::IpLookup,
        })
    }
}
