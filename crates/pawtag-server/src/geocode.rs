//! Reverse geocoding of finder positions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// City and country resolved for a coordinate pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Invalid geocoder URL: {0}")]
    InvalidUrl(String),

    #[error("Geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError>;
}

/// Client for the Nominatim `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(&format!("{}/reverse", base_url.trim_end_matches('/')))
            .map_err(|_| GeocodeError::InvalidUrl(base_url.to_string()))?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string());

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Unavailable(response.status().to_string()));
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.into_place())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    country: Option<String>,
}

impl ReverseResponse {
    /// Small places come back as `town` instead of `city`.
    fn into_place(self) -> Place {
        let address = self.address.unwrap_or_default();
        Place {
            city: address.city.or(address.town),
            country: address.country,
        }
    }
}
